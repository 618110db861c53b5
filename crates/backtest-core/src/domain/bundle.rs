//! 통계 결과 묶음 타입.
//!
//! 원격 서비스가 계산한 지표를 그대로 옮겨 담습니다. 값의 타입 변환이나
//! 재계산은 하지 않습니다.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// (지표 이름, 값) 2열 테이블.
///
/// 서비스가 보낸 순서를 유지합니다. 섹션이 없거나 비어 있으면 빈 테이블입니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetricsTable {
    entries: Vec<(String, Value)>,
}

impl MetricsTable {
    /// 빈 테이블 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 행 추가.
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.entries.push((name.into(), value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 이름으로 값 조회.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// 지표 이름 목록 (순서 유지).
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(key, _)| key.as_str()).collect()
    }
}

impl FromIterator<(String, Value)> for MetricsTable {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// 잔고 시계열의 한 지점.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancePoint {
    /// 시점 (서비스가 보낸 표기 그대로)
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: String,
    /// 계좌 잔고
    pub balance: f64,
}

impl BalancePoint {
    pub fn new(timestamp: impl Into<String>, balance: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            balance,
        }
    }
}

/// 문자열 또는 숫자 타임스탬프를 문자열로 역직렬화.
///
/// 서비스는 ISO 형식 문자열이나 epoch 숫자 중 하나를 보냅니다.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "timestamp must be a string or number, got {}",
            other
        ))),
    }
}

/// 백테스트 통계 묶음.
///
/// 세 부분은 각각 독립적으로 비어 있을 수 있지만 `None`이 되지는 않습니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultBundle {
    /// 비복리(시점) 지표
    pub static_metrics: MetricsTable,
    /// 복리 지표
    pub compounding_metrics: MetricsTable,
    /// 잔고 시계열
    pub balance_series: Vec<BalancePoint>,
}

impl ResultBundle {
    pub fn new(
        static_metrics: MetricsTable,
        compounding_metrics: MetricsTable,
        balance_series: Vec<BalancePoint>,
    ) -> Self {
        Self {
            static_metrics,
            compounding_metrics,
            balance_series,
        }
    }

    /// 세 부분이 모두 비어 있는지 확인.
    pub fn is_empty(&self) -> bool {
        self.static_metrics.is_empty()
            && self.compounding_metrics.is_empty()
            && self.balance_series.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metrics_table_keeps_order() {
        let mut table = MetricsTable::new();
        table.push("Total Trades", json!(42));
        table.push("Win Rate", json!("61.9%"));
        table.push("Sharpe Ratio", json!(1.84));

        assert_eq!(table.names(), vec!["Total Trades", "Win Rate", "Sharpe Ratio"]);
        assert_eq!(table.get("Win Rate"), Some(&json!("61.9%")));
        assert_eq!(table.get("Sortino Ratio"), None);
    }

    #[test]
    fn test_balance_point_timestamp_formats() {
        let point: BalancePoint =
            serde_json::from_value(json!({"timestamp": "2024-01-01 00:00:00", "balance": 1000}))
                .unwrap();
        assert_eq!(point.timestamp, "2024-01-01 00:00:00");
        assert_eq!(point.balance, 1000.0);

        let point: BalancePoint =
            serde_json::from_value(json!({"timestamp": 1704067200000i64, "balance": 1012.5}))
                .unwrap();
        assert_eq!(point.timestamp, "1704067200000");

        let bad: Result<BalancePoint, _> =
            serde_json::from_value(json!({"timestamp": null, "balance": 1.0}));
        assert!(bad.is_err());
    }

    #[test]
    fn test_empty_bundle() {
        let bundle = ResultBundle::default();
        assert!(bundle.is_empty());
        assert!(bundle.static_metrics.is_empty());
        assert!(bundle.balance_series.is_empty());
    }
}
