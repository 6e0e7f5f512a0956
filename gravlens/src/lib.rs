// Copyright 2020-2022 Kevin Reid under the terms of the MIT License as detailed
// in the accompanying file README.md or <https://opensource.org/licenses/MIT>.

//! Platform-independent core of the `gravlens` black-hole renderer.
//!
//! This crate defines the scene model (camera, hitables, integration
//! parameters) and the complete semantics of the ray-tracing kernel: the
//! photon transport ODE, the texture-coordinate mappings, the compositing
//! operator, and the progressive accumulation rule. The GPU crate
//! (`gravlens-gpu`) implements the same kernel in WGSL, constant for
//! constant; the functions here are the reference the test suite exercises.

pub mod camera;
pub mod color;
pub mod mapping;
pub mod math;
pub mod physics;
pub mod scene;
pub mod texture;
pub mod trace;
