// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod model;
pub mod page;
pub mod query;
pub mod scroll;
pub mod state;
pub mod view;
pub mod widget;

pub use model::*;
pub use page::*;
pub use query::*;
pub use scroll::*;
pub use state::*;
pub use view::*;
pub use widget::*;
