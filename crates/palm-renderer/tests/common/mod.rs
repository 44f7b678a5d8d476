#![allow(dead_code)]

use std::{cell::Cell, f32::consts::FRAC_PI_2};

use bytemuck::cast_slice;
use glam::{Mat4, Quat, Vec3};
use palm_renderer::{
    palm_asset::{
        source::{AssetSource, MemorySource, MemorySourceError},
        texture::ImageAsset,
    },
    FrameScheduler, Lifecycle,
};

pub const PAYLOAD_URI: &str = "palm.bin";

#[derive(Default)]
struct PayloadBuilder {
    payload: Vec<u8>,
    views: Vec<String>,
    accessors: Vec<String>,
}

impl PayloadBuilder {
    fn push(
        &mut self,
        bytes: &[u8],
        component_type: u32,
        count: usize,
        element_type: &str,
        bounds: &str,
    ) -> usize {
        while self.payload.len() % 4 != 0 {
            self.payload.push(0);
        }
        let offset = self.payload.len();
        self.payload.extend_from_slice(bytes);
        self.views.push(format!(
            r#"{{"buffer":0,"byteOffset":{},"byteLength":{}}}"#,
            offset,
            bytes.len()
        ));
        self.accessors.push(format!(
            r#"{{"bufferView":{},"componentType":{},"count":{},"type":"{}"{}}}"#,
            self.views.len() - 1,
            component_type,
            count,
            element_type,
            bounds
        ));
        self.accessors.len() - 1
    }
}

pub struct Fixture {
    pub document: String,
    pub payload: Vec<u8>,
}

/// Two sibling joints under a three vertex palm. The root joint sits at
/// y = 1 and turns from rest to a quarter turn around Z over
/// `[0, end_time]`; the tip joint sits at x = 1 and never moves.
pub fn palm_fixture(end_time: f32, with_joints: bool) -> Fixture {
    const FLOAT: u32 = 5126;
    const UNSIGNED_BYTE: u32 = 5121;
    const UNSIGNED_SHORT: u32 = 5123;

    let mut builder = PayloadBuilder::default();
    let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
    let position = builder.push(
        cast_slice(&positions),
        FLOAT,
        3,
        "VEC3",
        r#","min":[0,0,0],"max":[1,2,0]"#,
    );
    let joints: [[u8; 4]; 3] = [[0, 0, 0, 0], [1, 0, 0, 0], [0, 1, 0, 0]];
    let joint = builder.push(cast_slice(&joints), UNSIGNED_BYTE, 3, "VEC4", "");
    let weights: [[f32; 4]; 3] = [
        [1.0, 0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0, 0.0],
        [0.5, 0.5, 0.0, 0.0],
    ];
    let weight = builder.push(cast_slice(&weights), FLOAT, 3, "VEC4", "");
    let tex_coords: [[f32; 2]; 3] = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
    let tex_coord = builder.push(cast_slice(&tex_coords), FLOAT, 3, "VEC2", "");
    let indices: [u16; 3] = [0, 1, 2];
    let index = builder.push(cast_slice(&indices), UNSIGNED_SHORT, 3, "SCALAR", "");

    let inverse_binds = [
        Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)).to_cols_array(),
        Mat4::from_translation(Vec3::new(-1.0, 0.0, 0.0)).to_cols_array(),
    ];
    let inverse_bind = builder.push(cast_slice(&inverse_binds), FLOAT, 2, "MAT4", "");

    let times = [0.0f32, end_time];
    let time = builder.push(
        cast_slice(&times),
        FLOAT,
        2,
        "SCALAR",
        &format!(r#","min":[0],"max":[{}]"#, end_time),
    );
    let rotations = [
        Quat::IDENTITY.to_array(),
        Quat::from_rotation_z(FRAC_PI_2).to_array(),
    ];
    let rotation = builder.push(cast_slice(&rotations), FLOAT, 2, "VEC4", "");

    let attributes = if with_joints {
        format!(
            r#"{{"POSITION":{},"JOINTS_0":{},"WEIGHTS_0":{},"TEXCOORD_0":{}}}"#,
            position, joint, weight, tex_coord
        )
    } else {
        format!(
            r#"{{"POSITION":{},"WEIGHTS_0":{},"TEXCOORD_0":{}}}"#,
            position, weight, tex_coord
        )
    };

    let document = format!(
        r#"{{
            "asset": {{"version": "2.0"}},
            "scene": 0,
            "scenes": [{{"nodes": [0, 1, 2]}}],
            "nodes": [
                {{"name": "root_joint", "translation": [0, 1, 0]}},
                {{"name": "tip_joint", "translation": [1, 0, 0]}},
                {{"name": "palm", "mesh": 0, "skin": 0}}
            ],
            "skins": [{{"joints": [0, 1], "inverseBindMatrices": {inverse_bind}}}],
            "meshes": [{{"primitives": [{{"attributes": {attributes}, "indices": {index}}}]}}],
            "animations": [{{
                "channels": [{{"sampler": 0, "target": {{"node": 0, "path": "rotation"}}}}],
                "samplers": [{{"input": {time}, "output": {rotation}, "interpolation": "LINEAR"}}]
            }}],
            "buffers": [{{"uri": "{uri}", "byteLength": {length}}}],
            "bufferViews": [{views}],
            "accessors": [{accessors}]
        }}"#,
        inverse_bind = inverse_bind,
        attributes = attributes,
        index = index,
        time = time,
        rotation = rotation,
        uri = PAYLOAD_URI,
        length = builder.payload.len(),
        views = builder.views.join(","),
        accessors = builder.accessors.join(","),
    );

    Fixture {
        document,
        payload: builder.payload,
    }
}

pub fn texture() -> ImageAsset {
    ImageAsset::new(2, 2, vec![255; 16]).unwrap()
}

pub fn memory_source(fixture: Fixture) -> MemorySource {
    MemorySource::new(fixture.document, texture()).with_payload(PAYLOAD_URI, fixture.payload)
}

/// Detaches the lifecycle the moment the texture is requested.
pub struct DetachingSource {
    pub inner: MemorySource,
    pub lifecycle: Lifecycle,
}

impl AssetSource for DetachingSource {
    type Error = MemorySourceError;

    async fn scene_document(&self) -> Result<Vec<u8>, Self::Error> {
        self.inner.scene_document().await
    }

    async fn binary_payload(&self, uri: &str) -> Result<Vec<u8>, Self::Error> {
        self.inner.binary_payload(uri).await
    }

    async fn texture_image(&self) -> Result<ImageAsset, Self::Error> {
        self.lifecycle.detach();
        self.inner.texture_image().await
    }
}

#[derive(Default)]
pub struct CountingScheduler {
    requests: Cell<usize>,
}

impl CountingScheduler {
    pub fn requests(&self) -> usize {
        self.requests.get()
    }
}

impl FrameScheduler for CountingScheduler {
    fn request_frame(&self) {
        self.requests.set(self.requests.get() + 1);
    }
}

pub fn read_matrices(bytes: &[u8]) -> Vec<Mat4> {
    bytes
        .chunks_exact(64)
        .map(|chunk| {
            let mut floats = [0.0f32; 16];
            for (float, bytes) in floats.iter_mut().zip(chunk.chunks_exact(4)) {
                *float = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            }
            Mat4::from_cols_array(&floats)
        })
        .collect()
}
