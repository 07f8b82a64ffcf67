//! AWS SDK client initialisation for DynamoDB.
//!
//! Credentials and region come from the standard AWS provider chain. An
//! explicit endpoint can be supplied to target DynamoDB Local.

pub mod clients;

pub use clients::AwsClients;
