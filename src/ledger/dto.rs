use serde::{Deserialize, Serialize};

use super::repo_types::Metric;

#[derive(Debug, Default, Deserialize)]
pub struct RecordEventRequest {
    pub metric: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub value: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub metric: Metric,
    pub net_balance: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_type_field() {
        let req: RecordEventRequest =
            serde_json::from_str(r#"{"metric":"xp","type":"spend","value":3}"#).unwrap();
        assert_eq!(req.kind.as_deref(), Some("spend"));
        assert_eq!(req.value, Some(3));
    }
}
