//! Traits for external collaborators, implemented outside this workspace.

pub mod notification_api;

pub use notification_api::NotificationApi;
