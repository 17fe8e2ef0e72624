//! 题库加载器
//!
//! 读取 `[[questions]]` 格式的 TOML 题库，编号按文件顺序分配。

use crate::error::{AppError, AppResult, BankError, FileError};
use crate::models::question::{QuestionBank, QuestionBankFile};
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载题库
///
/// 非法题目会被跳过；文件不存在、解析失败或没有任何可用题目时返回错误
///
/// # 参数
/// - `path`: 题库文件路径
///
/// # 返回
/// 返回加载好的题库，错误信息中带有文件路径
pub async fn load_question_bank(path: &Path) -> AppResult<QuestionBank> {
    let path_str = path.display().to_string();

    if !fs::try_exists(path).await.unwrap_or(false) {
        return Err(FileError::NotFound { path: path_str }.into());
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(&path_str, e))?;

    let bank = parse_question_bank(&content).map_err(|e| match e {
        AppError::File(FileError::TomlParseFailed { source, .. }) => {
            AppError::toml_parse_failed(&path_str, source)
        }
        other => other,
    })?;

    if bank.is_empty() {
        return Err(BankError::Empty { path: path_str }.into());
    }

    tracing::info!("成功加载 {} 道题目: {}", bank.len(), path_str);
    for (level, count) in crate::models::LEVELS.iter().zip(bank.counts_by_level()) {
        tracing::debug!("  {} -> {} 道", level, count);
    }

    Ok(bank)
}

/// 解析 TOML 文本为题库
pub fn parse_question_bank(content: &str) -> AppResult<QuestionBank> {
    let file: QuestionBankFile = toml::from_str(content)?;
    Ok(QuestionBank::from_entries(file.questions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Level;
    use tokio_test::assert_ok;

    const SAMPLE: &str = r#"
        [[questions]]
        level = "A1.1"
        sentence = "Shalom means?"
        options = ["Hello", "Goodbye night", "Thanks"]
        correct = "Hello"

        [[questions]]
        level = "A1.2"
        sentence = "Toda means?"
        options = ["Please", "Thanks"]
        correct = "Thanks"
    "#;

    #[test]
    fn test_parse_question_bank() {
        let bank = parse_question_bank(SAMPLE).unwrap();
        assert_eq!(bank.len(), 2);
        assert_eq!(bank.questions()[1].level, Level::A1_2);
    }

    #[test]
    fn test_parse_question_bank_bad_toml() {
        let err = parse_question_bank("questions = [").unwrap_err();
        assert!(matches!(
            err,
            AppError::File(FileError::TomlParseFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_question_bank_from_file() {
        let path = std::env::temp_dir().join(format!(
            "level_placement_bank_{}.toml",
            std::process::id()
        ));
        tokio::fs::write(&path, SAMPLE).await.unwrap();

        let bank = assert_ok!(load_question_bank(&path).await);
        assert_eq!(bank.len(), 2);

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_load_question_bank_missing_file() {
        let path = Path::new("definitely/not/here/questions.toml");
        let err = load_question_bank(path).await.unwrap_err();
        assert!(matches!(err, AppError::File(FileError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_load_question_bank_parse_error_names_file() {
        let path = std::env::temp_dir().join(format!(
            "level_placement_broken_{}.toml",
            std::process::id()
        ));
        tokio::fs::write(&path, "[[questions]\nlevel = ").await.unwrap();

        let err = load_question_bank(&path).await.unwrap_err();
        match err {
            AppError::File(FileError::TomlParseFailed { path: reported, .. }) => {
                assert_eq!(reported, path.display().to_string());
            }
            other => panic!("应为 TOML 解析错误: {}", other),
        }

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_load_question_bank_empty_is_error() {
        let path = std::env::temp_dir().join(format!(
            "level_placement_empty_{}.toml",
            std::process::id()
        ));
        tokio::fs::write(&path, "").await.unwrap();

        let err = load_question_bank(&path).await.unwrap_err();
        assert!(matches!(err, AppError::Bank(BankError::Empty { .. })));

        let _ = tokio::fs::remove_file(&path).await;
    }
}
