// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod columns;
pub mod csv;
pub mod gateway;
pub mod merge;
pub mod model;
pub mod session;
pub mod table;

pub use columns::*;
pub use gateway::*;
pub use merge::merge_rows;
pub use model::*;
pub use session::*;
pub use table::*;
