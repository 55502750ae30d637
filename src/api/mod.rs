// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! HTTP API surface: the /embed endpoint, health route, and the
//! structured error taxonomy.

pub mod embed;
pub mod errors;
pub mod http_server;

pub use errors::{ApiError, ErrorResponse};
pub use http_server::{router, start_server, AppState};
