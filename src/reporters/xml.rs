//! XML 报告
//!
//! 先去掉体积大的部分再渲染，最后对整段文本做清洗，保证输出能被 XML 解析器接受。

use crate::error::AppResult;
use crate::models::AuditResult;
use core::fmt::Write;
use regex::{Captures, Regex};
use serde_json::Value as JsonValue;
use std::sync::LazyLock;

/// 渲染前从每个结果中删除的键
const HEAVY_KEYS: &[&str] = &["toolsResults", "javascriptExecutionTree"];

const MANIFEST: &str = "<?xml version='1.0' encoding='utf-8'?>";

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)([^<>\s/?!]*)(/?)>").expect("invalid regex"));

static TEXT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r">([^<]+)<").expect("invalid regex"));

pub fn generate<W: Write>(batch: &[AuditResult], writer: &mut W) -> AppResult<()> {
    let mut rendered = String::new();
    writeln!(rendered, "{}", MANIFEST)?;
    writeln!(rendered, "<results>")?;
    for result in batch {
        let mut value = serde_json::to_value(result)?;
        if let JsonValue::Object(map) = &mut value {
            for key in HEAVY_KEYS {
                map.remove(*key);
            }
        }
        render_element(&mut rendered, "result", &value, 1)?;
    }
    write!(rendered, "</results>")?;

    write!(writer, "{}", sanitize(&rendered))?;
    Ok(())
}

fn render_element(out: &mut String, name: &str, value: &JsonValue, depth: usize) -> core::fmt::Result {
    let name = tag_name(name);
    let indent = "  ".repeat(depth);
    match value {
        JsonValue::Null => writeln!(out, "{indent}<{name}/>"),
        JsonValue::Bool(b) => writeln!(out, "{indent}<{name}>{b}</{name}>"),
        JsonValue::Number(n) => writeln!(out, "{indent}<{name}>{n}</{name}>"),
        JsonValue::String(s) => writeln!(out, "{indent}<{name}>{}</{name}>", escape_text(s)),
        JsonValue::Array(items) => {
            writeln!(out, "{indent}<{name}>")?;
            let child = singular(&name);
            for item in items {
                render_element(out, &child, item, depth + 1)?;
            }
            writeln!(out, "{indent}</{name}>")
        }
        JsonValue::Object(map) => {
            writeln!(out, "{indent}<{name}>")?;
            for (key, item) in map {
                render_element(out, key, item, depth + 1)?;
            }
            writeln!(out, "{indent}</{name}>")
        }
    }
}

/// 把任意 JSON 键转换成合法的 XML 标签名
///
/// `#` `[` `]` 直接去掉，其余不能出现在标签名中的字符（空格、`/`、`:` 等）替换为 `_`；
/// 结果为空或不能作为开头时补 `_`。
fn tag_name(key: &str) -> String {
    let name: String = key
        .chars()
        .filter(|c| !matches!(c, '#' | '[' | ']'))
        .map(|c| if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') { c } else { '_' })
        .collect();
    match name.chars().next() {
        None => "_".to_string(),
        Some(first) if first.is_alphabetic() || first == '_' => name,
        Some(_) => format!("_{name}"),
    }
}

/// 数组元素的标签名：复数去掉末尾的 s，否则用 item
fn singular(name: &str) -> String {
    match name.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => "item".to_string(),
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// 清洗渲染后的 XML 文本
///
/// - 标签名中去掉 `#` `[` `]`，清洗后为空的标签名改为 `_`
/// - 非空白文本内容中去掉换行
/// - 全文去掉 XML 1.0 不允许的字符：`\t` `\n` `\r` 以外的控制字符，以及 `\u{FFFE}` `\u{FFFF}`
pub fn sanitize(xml: &str) -> String {
    let tags_cleaned = TAG_REGEX.replace_all(xml, |caps: &Captures<'_>| {
        let name: String = caps[2].chars().filter(|c| !matches!(c, '#' | '[' | ']')).collect();
        let name = if name.is_empty() { "_".to_string() } else { name };
        format!("<{}{}{}>", &caps[1], name, &caps[3])
    });

    let text_cleaned = TEXT_REGEX.replace_all(&tags_cleaned, |caps: &Captures<'_>| {
        let text = &caps[1];
        if text.trim().is_empty() {
            format!(">{}<", text)
        } else {
            format!(">{}<", text.replace('\n', ""))
        }
    });

    text_cleaned
        .chars()
        .filter(|c| !is_forbidden_char(*c))
        .collect()
}

fn is_forbidden_char(c: char) -> bool {
    (c.is_control() && !matches!(c, '\t' | '\n' | '\r')) || matches!(c, '\u{FFFE}' | '\u{FFFF}')
}
