//! 응답 정규화.
//!
//! 원격 서비스의 세 가지 응답 형태를 표준 테이블로 바꿉니다:
//! - JSON 지표 객체 → [`MetricsTable`]
//! - JSON 레코드 배열 → [`TradeLog`]
//! - 구분자 텍스트 → [`TradeLog`]
//!
//! 서비스는 지표 섹션을 각각 생략할 수 있으므로 "없음"과 "비어 있음"을
//! 구분하지 않고 모두 빈 테이블로 돌려줍니다.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::{BalancePoint, MetricsTable, ResultBundle, TradeLog};
use crate::error::{BacktestError, BacktestResult};

/// `results` 아래 비복리 지표 키.
pub const STATIC_KEY: &str = "Static";
/// `results` 아래 복리 지표 키.
pub const COMPOUNDING_KEY: &str = "Compounding";
/// 최상위 결과 키.
pub const RESULTS_KEY: &str = "results";
/// 최상위 잔고 시계열 키.
pub const BALANCES_KEY: &str = "balances";

/// JSON 묶음 해석 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    /// 없는 섹션은 빈 테이블로 채움 (통계 조회)
    Lenient,
    /// `results.Static`, `results.Compounding`이 모두 있어야 함 (백테스트 제출)
    Strict,
}

/// 지표 객체를 (이름, 값) 테이블로 정규화.
///
/// 값은 변환 없이 그대로 옮기고 키 순서를 유지합니다.
/// `None`, `null`, `{}`는 모두 빈 테이블이 됩니다.
pub fn normalize_metrics(raw: Option<&Value>) -> BacktestResult<MetricsTable> {
    match raw {
        None | Some(Value::Null) => Ok(MetricsTable::new()),
        Some(Value::Object(map)) => Ok(map
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()),
        Some(other) => Err(BacktestError::ShapeMismatch(format!(
            "metrics section must be an object, got {}",
            json_type_name(other)
        ))),
    }
}

/// 잔고 시계열 정규화.
///
/// 시점이나 수치 잔고가 없는 항목은 경고를 남기고 건너뜁니다.
/// `balances`가 배열이 아닐 때만 `BacktestError::ShapeMismatch`입니다.
pub fn normalize_balances(raw: Option<&Value>) -> BacktestResult<Vec<BalancePoint>> {
    match raw {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| match BalancePoint::deserialize(item) {
                Ok(point) => Some(point),
                Err(e) => {
                    warn!(index, "Skipping balance entry: {}", e);
                    None
                }
            })
            .collect()),
        Some(other) => Err(BacktestError::ShapeMismatch(format!(
            "balances must be an array, got {}",
            json_type_name(other)
        ))),
    }
}

/// JSON 레코드 배열을 거래 로그로 정규화.
///
/// 열은 모든 레코드의 키를 처음 등장한 순서대로 모은 것입니다.
/// 특정 레코드에 없는 열은 `null`로 채웁니다.
pub fn normalize_records(records: &[Value]) -> BacktestResult<TradeLog> {
    let mut objects: Vec<&Map<String, Value>> = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        match record {
            Value::Object(map) => objects.push(map),
            other => {
                return Err(BacktestError::ShapeMismatch(format!(
                    "record {} must be an object, got {}",
                    index,
                    json_type_name(other)
                )))
            }
        }
    }

    let mut columns: Vec<String> = Vec::new();
    for object in &objects {
        for key in object.keys() {
            if !columns.iter().any(|column| column == key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = objects
        .iter()
        .map(|object| {
            columns
                .iter()
                .map(|column| object.get(column).cloned().unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    TradeLog::new(columns, rows)
}

/// 구분자 텍스트(CSV)를 거래 로그로 파싱.
///
/// 첫 줄은 헤더입니다. 셀 타입은 추론하지 않고 모두 문자열로 보관하며,
/// 원본 본문도 함께 보관합니다.
pub fn parse_delimited(body: &str) -> BacktestResult<TradeLog> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(body.as_bytes());

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|cell| Value::String(cell.to_string()))
                .collect::<Vec<_>>(),
        );
    }

    debug!(columns = columns.len(), rows = rows.len(), "Parsed delimited trade log");

    Ok(TradeLog::new(columns, rows)?.with_raw(body))
}

/// JSON 응답 본문을 통계 묶음으로 정규화.
pub fn bundle_from_json(body: &Value, strictness: Strictness) -> BacktestResult<ResultBundle> {
    let root = body.as_object().ok_or_else(|| {
        BacktestError::ShapeMismatch(format!(
            "response body must be an object, got {}",
            json_type_name(body)
        ))
    })?;

    let results = match root.get(RESULTS_KEY) {
        Some(Value::Object(results)) => Some(results),
        None | Some(Value::Null) => None,
        Some(other) => {
            return Err(BacktestError::ShapeMismatch(format!(
                "'{}' must be an object, got {}",
                RESULTS_KEY,
                json_type_name(other)
            )))
        }
    };

    if strictness == Strictness::Strict {
        let complete = results
            .map(|r| r.contains_key(STATIC_KEY) && r.contains_key(COMPOUNDING_KEY))
            .unwrap_or(false);
        if !complete {
            return Err(BacktestError::ShapeMismatch(format!(
                "unexpected response shape: expected '{}.{}' and '{}.{}'",
                RESULTS_KEY, STATIC_KEY, RESULTS_KEY, COMPOUNDING_KEY
            )));
        }
    }

    let static_metrics = normalize_metrics(results.and_then(|r| r.get(STATIC_KEY)))?;
    let compounding_metrics = normalize_metrics(results.and_then(|r| r.get(COMPOUNDING_KEY)))?;
    let balance_series = normalize_balances(root.get(BALANCES_KEY))?;

    Ok(ResultBundle::new(
        static_metrics,
        compounding_metrics,
        balance_series,
    ))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
