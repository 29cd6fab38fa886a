// Library root
// -----------
// The binary (`main.rs`) parses arguments and hands them to `ui::run`.
//
// Module responsibilities:
// - `cli`: argument definitions and validation into an `UploadRequest`.
// - `hash`: streaming SHA-256 of local files.
// - `api`: blocking MediaFire REST client, implements `store::RemoteStore`.
// - `capacity`: free-space check before anything remote is changed.
// - `resolver`: the destination/duplicate/upload/link state machine.
// - `workflow`: capacity check followed by resolution.
// - `ui`: spinners and the single line printed on stdout.
//
// The resolver only sees the `RemoteStore` trait, so the decision logic is
// tested against an in-memory store without a network.
pub mod api;
pub mod capacity;
pub mod cli;
pub mod error;
pub mod hash;
pub mod model;
pub mod resolver;
pub mod store;
pub mod ui;
pub mod workflow;
