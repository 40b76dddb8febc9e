//! Protobuf definitions shared by Tessera services and their clients.

pub mod account {
    tonic::include_proto!("account");
}
