//! 渲染器 - 外部协作者
//!
//! PDF / HTML 字节渲染由外部引擎完成，这里只定义接口。
//! `JsonRenderer` 把文档序列化为 JSON，供命令行演示和测试使用。

use async_trait::async_trait;

use crate::error::{AppResult, RenderError};
use crate::models::document::Document;
use crate::models::template::RenderFormat;

#[async_trait]
pub trait Renderer: Send + Sync {
    /// 把编译好的文档渲染为字节
    ///
    /// # 参数
    /// * `document` - 编译结果，渲染器不得修改内容
    /// * `format` - 请求的输出格式
    ///
    /// # 返回
    /// 渲染后的字节；失败时返回 `RenderError`
    async fn render(&self, document: &Document, format: RenderFormat) -> AppResult<Vec<u8>>;

    /// 输出文件扩展名，默认与请求格式一致
    fn file_extension(&self, format: RenderFormat) -> &'static str {
        format.extension()
    }
}

/// 不论请求哪种格式都输出 JSON，文件扩展名固定为 `json`
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRenderer;

#[async_trait]
impl Renderer for JsonRenderer {
    fn file_extension(&self, _format: RenderFormat) -> &'static str {
        "json"
    }

    async fn render(&self, document: &Document, format: RenderFormat) -> AppResult<Vec<u8>> {
        let bytes = serde_json::to_vec_pretty(document).map_err(RenderError::from)?;
        if bytes.is_empty() {
            return Err(RenderError::EmptyOutput { format }.into());
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_output_uses_json_extension() {
        assert_eq!(JsonRenderer.file_extension(RenderFormat::Pdf), "json");
        assert_eq!(JsonRenderer.file_extension(RenderFormat::Html), "json");
    }
}
