//! 终端 - 基础设施层
//!
//! 持有唯一的输入/输出资源，只暴露"提问、输出"的能力

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

use crate::error::{AppError, AppResult};

/// 终端
///
/// 职责：
/// - 持有输入和输出
/// - 暴露 ask() / say() 能力
/// - 不认识 Question / Profile
/// - 不处理业务流程
pub struct Console<R, W> {
    reader: R,
    writer: W,
}

impl Console<BufReader<Stdin>, Stdout> {
    /// 连接到进程的标准输入输出
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// 输出一行
    pub async fn say(&mut self, text: &str) -> AppResult<()> {
        self.writer
            .write_all(format!("{}\n", text).as_bytes())
            .await
            .map_err(|e| AppError::Other(format!("终端输出失败: {}", e)))?;
        self.writer
            .flush()
            .await
            .map_err(|e| AppError::Other(format!("终端输出失败: {}", e)))?;
        Ok(())
    }

    /// 输出提示并读取一行（去掉首尾空白）
    ///
    /// 输入已结束时返回 None
    pub async fn ask(&mut self, prompt: &str) -> AppResult<Option<String>> {
        self.writer
            .write_all(format!("{} ", prompt).as_bytes())
            .await
            .map_err(|e| AppError::Other(format!("终端输出失败: {}", e)))?;
        self.writer
            .flush()
            .await
            .map_err(|e| AppError::Other(format!("终端输出失败: {}", e)))?;

        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .await
            .map_err(|e| AppError::Other(format!("终端读取失败: {}", e)))?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// 取回输出端（测试里用来检查输出内容）
    pub fn into_writer(self) -> W {
        self.writer
    }
}
