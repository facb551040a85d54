pub mod collaborators;
pub mod load;
pub mod transport;
pub mod unit;

pub use collaborators::{MappedIdSource, StatusStore, SyncGate};
pub use load::LoadProvider;
pub use transport::{SchemaSource, Transport};
pub use unit::{
    LoadView, LookupView, MappingView, StatusView, Unit, UpsertInputView, UpsertOutputView,
};
