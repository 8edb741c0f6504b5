// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 fileflow contributors

//! Runtime drivers for the non-process nodes

mod fan_out;
mod param_gen;
mod sink;

pub use fan_out::run_fan_out;
pub use param_gen::run_param_generator;
pub use sink::run_sink;
