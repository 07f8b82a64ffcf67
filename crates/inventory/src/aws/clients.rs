//! AWS SDK client bundle.

use anyhow::Result;
use aws_config::BehaviorVersion;
use tracing::info;

/// Bundle of AWS SDK clients used by the service.
#[derive(Clone, Debug)]
pub struct AwsClients {
    /// DynamoDB client used by the record table.
    pub dynamodb: aws_sdk_dynamodb::Client,
}

impl AwsClients {
    /// Initialise all AWS SDK clients.
    ///
    /// When `dynamodb_endpoint` is set, the DynamoDB client targets it instead
    /// of the regional endpoint (e.g. `http://localhost:8000` for DynamoDB Local).
    ///
    /// # Errors
    ///
    /// Returns an error if the SDK config cannot be loaded.
    pub async fn init(dynamodb_endpoint: Option<&str>) -> Result<Self> {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;

        let mut builder = aws_sdk_dynamodb::config::Builder::from(&config);
        if let Some(endpoint) = dynamodb_endpoint {
            info!(endpoint, "using DynamoDB endpoint override");
            builder = builder.endpoint_url(endpoint);
        }

        Ok(Self {
            dynamodb: aws_sdk_dynamodb::Client::from_conf(builder.build()),
        })
    }
}
