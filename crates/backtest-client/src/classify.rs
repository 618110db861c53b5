//! 제출 응답 분류.
//!
//! 응답 형태는 Content-Type 헤더만으로 결정합니다.
//!
//! | 미디어 타입 | 결과 |
//! |---|---|
//! | `application/json` | `BacktestResponse::Bundle` |
//! | `text/csv`, `application/csv` | `BacktestResponse::TradeLog` |
//! | 그 외 / 헤더 없음 | `UnsupportedFormat` |

use backtest_core::{
    bundle_from_json, parse_delimited, BacktestError, BacktestResponse, BacktestResult, Strictness,
};
use tracing::debug;

const JSON_MEDIA_TYPE: &str = "application/json";
const CSV_MEDIA_TYPES: [&str; 2] = ["text/csv", "application/csv"];
const MISSING_CONTENT_TYPE: &str = "<missing>";

/// 응답 상태, Content-Type, 본문으로 제출 결과를 분류.
///
/// 2xx가 아닌 상태는 본문과 함께 `BacktestError::Status`로 반환합니다.
/// JSON 본문에는 `results.Static`과 `results.Compounding`이 모두 있어야 합니다.
pub fn classify_response(
    status: u16,
    content_type: Option<&str>,
    body: &[u8],
) -> BacktestResult<BacktestResponse> {
    if !(200..300).contains(&status) {
        return Err(BacktestError::Status {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        });
    }

    let content_type = content_type
        .ok_or_else(|| BacktestError::UnsupportedFormat(MISSING_CONTENT_TYPE.to_string()))?;
    let media_type = media_type(content_type);

    debug!(media_type = %media_type, bytes = body.len(), "Classifying response");

    if media_type == JSON_MEDIA_TYPE {
        let value: serde_json::Value = serde_json::from_slice(body)?;
        let bundle = bundle_from_json(&value, Strictness::Strict)?;
        Ok(BacktestResponse::Bundle(bundle))
    } else if CSV_MEDIA_TYPES.contains(&media_type.as_str()) {
        let text = std::str::from_utf8(body).map_err(|e| {
            BacktestError::Decode(format!("delimited body is not valid UTF-8: {}", e))
        })?;
        Ok(BacktestResponse::TradeLog(parse_delimited(text)?))
    } else {
        Err(BacktestError::UnsupportedFormat(content_type.to_string()))
    }
}

/// 파라미터를 제외한 소문자 미디어 타입.
fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
