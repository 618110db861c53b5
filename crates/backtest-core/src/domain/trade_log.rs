//! 거래별 레코드 로그.
//!
//! 행 순서와 열 구성을 서비스가 보낸 그대로 보존합니다. 셀 값은
//! `serde_json::Value`로 보관하며, 구분자 텍스트에서 온 경우 모든 셀이 문자열입니다.

use serde::Serialize;
use serde_json::Value;

use super::bundle::BalancePoint;
use crate::error::{BacktestError, BacktestResult};

/// 파생 잔고 열 이름.
pub const BALANCE_COLUMN: &str = "running_balance";

/// 거래별 레코드 시퀀스.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TradeLog {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    /// 수신한 원본 본문 (구분자 텍스트로 받은 경우)
    #[serde(skip)]
    raw: Option<String>,
}

impl TradeLog {
    /// 열 이름과 행으로 로그 생성.
    ///
    /// # Errors
    /// 어떤 행의 셀 수가 열 수와 다르면 `BacktestError::ShapeMismatch`를 반환합니다.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> BacktestResult<Self> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(BacktestError::ShapeMismatch(format!(
                "row {} has {} cells, expected {}",
                index,
                row.len(),
                columns.len()
            )));
        }

        Ok(Self {
            columns,
            rows,
            raw: None,
        })
    }

    /// 원본 본문을 함께 보관.
    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// 원본 본문 반환.
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// 열 위치 조회.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// 열 전체 값 조회.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// 특정 셀 조회.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|cells| &cells[index])
    }

    /// 열을 설정합니다. 같은 이름의 열이 있으면 교체하고 없으면 끝에 추가합니다.
    ///
    /// `values` 길이는 행 수와 같아야 하며 호출자가 보장합니다.
    pub(crate) fn set_column(&mut self, name: &str, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.rows.len());

        match self.column_index(name) {
            Some(index) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[index] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// CSV로 다시 직렬화 (파생 열 포함).
    pub fn to_csv(&self) -> BacktestResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(cell_text))?;
        }

        let bytes = wtr
            .into_inner()
            .map_err(|e| BacktestError::ShapeMismatch(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| BacktestError::Decode(e.to_string()))
    }

    /// 차트용 (x, 잔고) 시계열.
    ///
    /// 잔고 파생 이후에 사용합니다. x 열은 보통 `exit_at`입니다.
    pub fn balance_points(&self, x_column: &str) -> BacktestResult<Vec<BalancePoint>> {
        let x_index = self.column_index(x_column).ok_or_else(|| {
            BacktestError::ShapeMismatch(format!("missing column '{}'", x_column))
        })?;
        let balance_index = self.column_index(BALANCE_COLUMN).ok_or_else(|| {
            BacktestError::ShapeMismatch(format!("missing column '{}'", BALANCE_COLUMN))
        })?;

        self.rows
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                let balance = cells[balance_index].as_f64().ok_or_else(|| {
                    BacktestError::InvalidRecord {
                        row,
                        reason: "balance is not numeric".to_string(),
                    }
                })?;
                Ok(BalancePoint::new(cell_text(&cells[x_index]), balance))
            })
            .collect()
    }
}

/// 셀 값을 표시/CSV용 텍스트로 변환.
///
/// 문자열은 따옴표 없이, `null`은 빈 문자열로 출력합니다.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_log() -> TradeLog {
        TradeLog::new(
            vec!["profit".to_string(), "exit_at".to_string()],
            vec![
                vec![json!("50"), json!("2024-01-01")],
                vec![json!("-20"), json!("2024-01-02")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let result = TradeLog::new(
            vec!["profit".to_string(), "exit_at".to_string()],
            vec![vec![json!("50")]],
        );
        assert!(matches!(result, Err(BacktestError::ShapeMismatch(_))));
    }

    #[test]
    fn test_column_access() {
        let log = sample_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log.column_index("exit_at"), Some(1));
        assert_eq!(log.cell(1, "profit"), Some(&json!("-20")));
        assert!(log.column("fee").is_none());
    }

    #[test]
    fn test_set_column_appends_then_replaces() {
        let mut log = sample_log();
        log.set_column(BALANCE_COLUMN, vec![json!(1.0), json!(2.0)]);
        assert_eq!(log.columns().len(), 3);

        log.set_column(BALANCE_COLUMN, vec![json!(3.0), json!(4.0)]);
        assert_eq!(log.columns().len(), 3);
        assert_eq!(log.cell(0, BALANCE_COLUMN), Some(&json!(3.0)));
    }

    #[test]
    fn test_to_csv() {
        let mut log = sample_log();
        log.set_column(BALANCE_COLUMN, vec![json!(1050.0), json!(1030.0)]);

        let csv = log.to_csv().unwrap();
        assert_eq!(
            csv,
            "profit,exit_at,running_balance\n50,2024-01-01,1050.0\n-20,2024-01-02,1030.0\n"
        );
    }

    #[test]
    fn test_balance_points_require_balance_column() {
        let log = sample_log();
        assert!(log.balance_points("exit_at").is_err());
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&json!("abc")), "abc");
        assert_eq!(cell_text(&Value::Null), "");
        assert_eq!(cell_text(&json!(12.5)), "12.5");
        assert_eq!(cell_text(&json!(true)), "true");
    }
}
