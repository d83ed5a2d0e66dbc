//! 词表数据加载模块
//!
//! 从静态数据文件读取词表清单与单词数组，只读消费：
//! - 清单: JSON 数组，条目为 [`VocabularyListMeta`]
//! - 单词: JSON 数组，或带表头的 CSV
//!   (`id,text,pinyin,translation,example,examplePinyin,exampleTranslation`)
//!
//! 同一文件内出现重复单词 id 视为数据错误直接拒绝，避免下游小节
//! 划分出现覆盖重叠。

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::store::models::{VocabularyListMeta, Word};

// ============================================================
// 错误类型定义
// ============================================================

/// 数据加载错误类型
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 解析错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV 第 {line} 行格式错误: {message}")]
    Csv { line: usize, message: String },

    #[error("不支持的数据文件格式: {0}")]
    UnsupportedFormat(String),

    #[error("重复的单词 id: {0}")]
    DuplicateWordId(String),
}

pub type DataResult<T> = Result<T, DataError>;

// ============================================================
// 加载入口
// ============================================================

/// 读取词表清单文件 (JSON 数组)
pub fn load_manifest<P: AsRef<Path>>(path: P) -> DataResult<Vec<VocabularyListMeta>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// 读取单词数据文件，按扩展名选择 JSON 或 CSV 解析
pub fn load_words<P: AsRef<Path>>(path: P) -> DataResult<Vec<Word>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let content = fs::read_to_string(path)?;
    let words = match extension.as_str() {
        "json" => parse_words_json(&content)?,
        "csv" => parse_words_csv(&content)?,
        other => return Err(DataError::UnsupportedFormat(other.to_string())),
    };

    ensure_unique_ids(&words)?;
    Ok(words)
}

/// 解析 JSON 单词数组
pub fn parse_words_json(content: &str) -> DataResult<Vec<Word>> {
    Ok(serde_json::from_str(content)?)
}

/// 解析带表头的 CSV 单词数据
///
/// 必需列: `id,text,pinyin,translation`；例句三列可缺省。
/// 支持双引号包裹的字段与 `""` 转义，空行跳过。
pub fn parse_words_csv(content: &str) -> DataResult<Vec<Word>> {
    let mut lines = content.lines().enumerate();

    let Some((_, header)) = lines.next() else {
        return Ok(Vec::new());
    };
    let header = header.trim_start_matches('\u{feff}');
    let columns = split_csv_line(header, 1)?;
    let find = |name: &str| columns.iter().position(|c| c.trim() == name);

    let required = |name: &str| {
        find(name).ok_or_else(|| DataError::Csv {
            line: 1,
            message: format!("缺少 {name} 列"),
        })
    };
    let id_col = required("id")?;
    let text_col = required("text")?;
    let pinyin_col = required("pinyin")?;
    let translation_col = required("translation")?;
    let example_col = find("example");
    let example_pinyin_col = find("examplePinyin");
    let example_translation_col = find("exampleTranslation");

    let mut words = Vec::new();
    for (index, raw) in lines {
        if raw.trim().is_empty() {
            continue;
        }
        let line_no = index + 1;
        let fields = split_csv_line(raw, line_no)?;

        let cell = |col: usize| fields.get(col).map(|s| s.trim().to_string());
        let require_cell = |col: usize, name: &str| {
            cell(col)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| DataError::Csv {
                    line: line_no,
                    message: format!("缺少 {name} 字段"),
                })
        };
        let optional_cell =
            |col: Option<usize>| col.and_then(|c| cell(c)).filter(|s| !s.is_empty());

        words.push(Word {
            id: require_cell(id_col, "id")?,
            text: require_cell(text_col, "text")?,
            pinyin: require_cell(pinyin_col, "pinyin")?,
            translation: require_cell(translation_col, "translation")?,
            example: optional_cell(example_col),
            example_pinyin: optional_cell(example_pinyin_col),
            example_translation: optional_cell(example_translation_col),
        });
    }

    Ok(words)
}

fn ensure_unique_ids(words: &[Word]) -> DataResult<()> {
    let mut seen = HashSet::new();
    for word in words {
        if !seen.insert(word.id.as_str()) {
            return Err(DataError::DuplicateWordId(word.id.clone()));
        }
    }
    Ok(())
}

fn split_csv_line(line: &str, line_no: usize) -> DataResult<Vec<String>> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else {
            match c {
                ',' => fields.push(std::mem::take(&mut field)),
                '"' if field.is_empty() => in_quotes = true,
                '"' => {
                    return Err(DataError::Csv {
                        line: line_no,
                        message: "引号只能出现在字段开头".to_string(),
                    })
                }
                _ => field.push(c),
            }
        }
    }

    if in_quotes {
        return Err(DataError::Csv {
            line: line_no,
            message: "引号未闭合".to_string(),
        });
    }

    fields.push(field);
    Ok(fields)
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_words_json() {
        let words = parse_words_json(
            r#"[
                {"id":"w1","text":"你好","pinyin":"nǐ hǎo","translation":"hello"},
                {"id":"w2","text":"谢谢","pinyin":"xiè xie","translation":"thanks",
                 "example":"谢谢你","examplePinyin":"xiè xie nǐ","exampleTranslation":"thank you"}
            ]"#,
        )
        .expect("parse json words");

        assert_eq!(words.len(), 2);
        assert_eq!(words[1].example.as_deref(), Some("谢谢你"));
    }

    #[test]
    fn test_parse_words_csv() {
        let csv = "id,text,pinyin,translation,example\n\
                   w1,你好,nǐ hǎo,hello,\n\
                   w2,再见,zài jiàn,\"goodbye, farewell\",再见了\n";
        let words = parse_words_csv(csv).expect("parse csv words");

        assert_eq!(words.len(), 2);
        assert_eq!(words[0].example, None);
        assert_eq!(words[1].translation, "goodbye, farewell");
        assert_eq!(words[1].example.as_deref(), Some("再见了"));
    }

    #[test]
    fn test_parse_csv_quote_escape_and_blank_lines() {
        let csv = "id,text,pinyin,translation\n\
                   \n\
                   w1,好,hǎo,\"say \"\"good\"\"\"\n";
        let words = parse_words_csv(csv).expect("parse csv");
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].translation, r#"say "good""#);
    }

    #[test]
    fn test_parse_csv_missing_column() {
        let err = parse_words_csv("id,text,translation\nw1,好,good\n").unwrap_err();
        assert!(matches!(err, DataError::Csv { line: 1, .. }));
    }

    #[test]
    fn test_parse_csv_missing_required_field() {
        let err = parse_words_csv("id,text,pinyin,translation\nw1,好,,good\n").unwrap_err();
        assert!(matches!(err, DataError::Csv { line: 2, .. }));
    }

    #[test]
    fn test_parse_csv_unclosed_quote() {
        let err = parse_words_csv("id,text,pinyin,translation\nw1,好,hǎo,\"oops\n").unwrap_err();
        assert!(matches!(err, DataError::Csv { line: 2, .. }));
    }

    #[test]
    fn test_load_words_rejects_duplicates() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("words.json");
        std::fs::write(
            &path,
            r#"[{"id":"w1","text":"一","pinyin":"yī","translation":"one"},
                {"id":"w1","text":"二","pinyin":"èr","translation":"two"}]"#,
        )
        .expect("write fixture");

        let err = load_words(&path).unwrap_err();
        assert!(matches!(err, DataError::DuplicateWordId(id) if id == "w1"));
    }

    #[test]
    fn test_load_words_unsupported_extension() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("words.xml");
        std::fs::write(&path, "<words/>").expect("write fixture");

        let err = load_words(&path).unwrap_err();
        assert!(matches!(err, DataError::UnsupportedFormat(ext) if ext == "xml"));
    }

    #[test]
    fn test_load_manifest() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("manifest.json");
        std::fs::write(
            &path,
            r#"[{"name":"HSK1","description":"入门词表","file":"hsk1.json",
                 "difficulty":"HSK1","tags":["beginner"],"wordCount":150}]"#,
        )
        .expect("write fixture");

        let manifest = load_manifest(&path).expect("load manifest");
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest[0].name, "HSK1");
        assert_eq!(manifest[0].word_count, Some(150));
    }
}
