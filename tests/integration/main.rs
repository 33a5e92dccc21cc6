//! Integration tests for the notification client.

mod helpers;

mod credential_test;
mod heartbeat_test;
mod reconnect_test;
mod routing_test;
