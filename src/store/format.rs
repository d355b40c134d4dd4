//! properties 文件格式编解码
//!
//! 实现扁平 `key=value` 文本文件的解析与序列化，
//! 转义规则与 Java properties 文件保持兼容

use chrono::Local;
use std::collections::HashMap;

/// 解析 properties 文本内容为键值映射
///
/// 跳过空行和以 `#`/`!` 开头的注释行，支持行尾反斜杠续行，
/// 键与值之间以首个未转义的 `=`、`:` 或空白分隔。
/// 解析是宽容的：格式异常的行按"整行为键、值为空"处理，不会报错。
pub fn parse(content: &str) -> HashMap<String, String> {
    let mut entries = HashMap::new();
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        let line = line.trim_start_matches([' ', '\t', '\x0c']);
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        // 行尾奇数个反斜杠表示下一物理行并入当前逻辑行
        let mut logical = String::from(line);
        while ends_with_odd_backslash(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical
                    .push_str(next.trim_start_matches([' ', '\t', '\x0c'])),
                None => break,
            }
        }

        let (key, value) = split_entry(&logical);
        entries.insert(unescape(key), unescape(value));
    }

    entries
}

/// 序列化键值映射为 properties 文本
///
/// 输出头部注释行和时间戳行，然后按键排序逐行写出，
/// 保证相同映射的两次序列化除时间戳行外逐字节一致。
pub fn serialize(entries: &HashMap<String, String>, comment: &str) -> String {
    let mut out = String::new();
    for line in comment.lines() {
        out.push_str("# ");
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("# ");
    out.push_str(&Local::now().to_rfc2822());
    out.push('\n');

    let mut keys: Vec<&String> = entries.keys().collect();
    keys.sort();
    for key in keys {
        out.push_str(&escape_key(key));
        out.push('=');
        out.push_str(&escape_value(&entries[key]));
        out.push('\n');
    }

    out
}

/// 转义键
///
/// 键中的所有空格都需要转义，否则会被当作键值分隔符
pub fn escape_key(key: &str) -> String {
    escape(key, true)
}

/// 转义值
///
/// 值只需转义开头的空格，中间的空格可以原样保留
pub fn escape_value(value: &str) -> String {
    escape(value, false)
}

fn escape(input: &str, escape_all_spaces: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for (i, c) in input.char_indices() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            ' ' if escape_all_spaces || i == 0 => out.push_str("\\ "),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}

/// 还原转义序列
///
/// 支持 `\t` `\n` `\r` `\f` `\uXXXX`，其余 `\X` 还原为 `X`
fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                {
                    Some(decoded) => out.push(decoded),
                    None => {
                        // 非法的 \u 序列按原样保留
                        out.push('u');
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}

/// 切分逻辑行为键和值
///
/// 键结束于首个未转义的 `=`、`:` 或空白；若分隔符是空白，
/// 其后还允许跟一个可选的 `=` 或 `:`
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    let mut separator = None;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                separator = Some(c);
                break;
            }
            ws if ws.is_whitespace() => {
                key_end = i;
                separator = Some(c);
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let mut rest = &line[key_end..];

    if let Some(sep) = separator {
        rest = rest[sep.len_utf8()..].trim_start();
        if sep.is_whitespace() {
            if let Some(c) = rest.chars().next() {
                if c == '=' || c == ':' {
                    rest = rest[c.len_utf8()..].trim_start();
                }
            }
        }
    }

    (key, rest)
}

fn ends_with_odd_backslash(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}
