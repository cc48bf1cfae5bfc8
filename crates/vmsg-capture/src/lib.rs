//! Camera permission coordination and bounded-duration video capture.
//!
//! This crate owns the front half of the message pipeline:
//! - [`PermissionCoordinator`] gates hardware access behind camera and
//!   microphone grants and republishes state on host foreground.
//! - [`CaptureController`] is the `idle -> recording -> stopped` state
//!   machine; all transitions flow through one event type so they are
//!   handled exhaustively in one place.
//! - [`CaptureLoop`] drives the controller with the 100 ms elapsed
//!   ticker and the hardware event channel.
//!
//! The camera itself is a collaborator behind [`CameraApi`]; this crate
//! never touches device handles directly.

pub mod error;
pub mod permissions;
pub mod recorder;

pub use error::{CaptureError, CaptureResult};
pub use permissions::{
    Capability, GrantStatus, PermissionCoordinator, PermissionState, PermissionsApi,
};
pub use recorder::{
    CameraApi, CaptureCommand, CaptureController, CaptureEffect, CaptureEvent, CaptureLoop,
    CaptureOutput, HardwareEvent, StopReason,
};
