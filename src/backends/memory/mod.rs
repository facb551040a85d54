// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod fixture;
mod load;
mod store;
mod transport;

pub use fixture::{Fixture, RelationFixture};
pub use load::InMemoryLoad;
pub use store::{RecordingStatusStore, SavedStatus};
pub use transport::InMemoryTransport;
