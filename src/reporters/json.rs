use crate::error::AppResult;
use crate::models::AuditResult;
use core::fmt::Write;

/// 整批结果输出为缩进 2 空格的 JSON 数组
pub fn generate<W: Write>(batch: &[AuditResult], writer: &mut W) -> AppResult<()> {
    write!(writer, "{}", serde_json::to_string_pretty(batch)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditOptions, ToolOutput};
    use serde_json::{json, Value};

    #[test]
    fn test_pretty_output_keeps_order_and_null_options() {
        let first = AuditResult::new("https://a.com", AuditOptions::default())
            .with_tool("phantomas", ToolOutput::default().with_metric("requests", 12.0));
        let second = AuditResult::new("https://b.com", AuditOptions::default());

        let mut out = String::new();
        generate(&[first, second], &mut out).unwrap();

        assert!(out.starts_with("[\n  {"));
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["params"]["url"], "https://a.com");
        assert_eq!(parsed[1]["params"]["url"], "https://b.com");
        assert_eq!(parsed[0]["params"]["options"]["proxy"], Value::Null);
        assert_eq!(parsed[0]["toolsResults"]["phantomas"]["metrics"]["requests"], json!(12));
    }

    #[test]
    fn test_empty_batch() {
        let mut out = String::new();
        generate(&[], &mut out).unwrap();
        assert_eq!(out, "[]");
    }
}
