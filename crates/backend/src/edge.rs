use crate::client::{send_json, BackendClient};
use async_trait::async_trait;
use medir_core::{DoctorSummary, FetchError, MatchingService};
use medir_types::RecordId;

/// Calls the edge function that returns the doctors treating a pathology.
///
/// `GET {base}/functions/v1/{function}?pathology_id=<id>`; a `null` body means no doctors.
pub struct EdgeMatchingService {
    client: BackendClient,
}

impl EdgeMatchingService {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    fn path(&self) -> String {
        function_path(self.client.config().matching_function())
    }
}

fn function_path(function: &str) -> String {
    format!("/functions/v1/{function}")
}

#[async_trait]
impl MatchingService for EdgeMatchingService {
    async fn doctors_by_pathology(
        &self,
        pathology_id: &RecordId,
    ) -> Result<Vec<DoctorSummary>, FetchError> {
        let request = self
            .client
            .get(&self.path())
            .query(&[("pathology_id", pathology_id.as_str())]);

        let doctors: Option<Vec<DoctorSummary>> = send_json("doctor", request).await?;
        Ok(doctors.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medir_core::DiscoveryConfig;
    use std::time::Duration;

    #[test]
    fn path_uses_configured_function() {
        let config = DiscoveryConfig::new(
            "https://directory.example.org",
            "anon",
            Some("user-token".into()),
            Some("match-doctors".into()),
            Duration::from_secs(5),
        )
        .expect("config");
        let service = EdgeMatchingService::new(BackendClient::new(config).expect("client"));
        assert_eq!(service.path(), "/functions/v1/match-doctors");
        assert_eq!(function_path("doctors-by-pathology"), "/functions/v1/doctors-by-pathology");
    }

    #[test]
    fn null_body_decodes_as_no_doctors() {
        let doctors: Option<Vec<DoctorSummary>> = serde_json::from_str("null").expect("decode");
        assert!(doctors.unwrap_or_default().is_empty());
    }
}
