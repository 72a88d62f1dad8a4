//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。
//! 每个错误都归入一个 [`ErrorKind`]，传输层只根据 kind 选择状态码。

use std::fmt;

/// 错误分类（核心层对外的错误契约）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 调用方输入不合法，不会产生任何写入
    Validation,
    /// 引用的资源不存在
    NotFound,
    /// 与现有状态冲突（重复提交、终态流转、并发更新）
    Conflict,
    /// 调用方没有权限
    Forbidden,
    /// 存储或事务失败
    Internal,
}

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - kind() 方法 - 返回错误分类
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_evalsystem_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal, $kind:ident)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum EvalSystemError {
            $($variant(String),)*
        }

        impl EvalSystemError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(EvalSystemError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(EvalSystemError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误分类
            pub fn kind(&self) -> ErrorKind {
                match self {
                    $(EvalSystemError::$variant(_) => ErrorKind::$kind,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(EvalSystemError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl EvalSystemError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        EvalSystemError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_evalsystem_errors! {
    Validation("E001", "Validation Error", Validation),
    NotFound("E002", "Resource Not Found", NotFound),
    Conflict("E003", "Conflict Error", Conflict),
    Authorization("E004", "Authorization Error", Forbidden),
    Authentication("E005", "Authentication Error", Forbidden),
    DatabaseConfig("E006", "Database Configuration Error", Internal),
    DatabaseConnection("E007", "Database Connection Error", Internal),
    DatabaseOperation("E008", "Database Operation Error", Internal),
    Serialization("E009", "Serialization Error", Internal),
    StoragePluginNotFound("E010", "Storage Plugin Not Found", Internal),
    ConcurrentModification("E011", "Concurrent Modification", Conflict),
}

impl EvalSystemError {
    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for EvalSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for EvalSystemError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for EvalSystemError {
    fn from(err: sea_orm::DbErr) -> Self {
        EvalSystemError::DatabaseOperation(err.to_string())
    }
}

impl From<serde_json::Error> for EvalSystemError {
    fn from(err: serde_json::Error) -> Self {
        EvalSystemError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EvalSystemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(EvalSystemError::validation("test").code(), "E001");
        assert_eq!(EvalSystemError::not_found("test").code(), "E002");
        assert_eq!(EvalSystemError::conflict("test").code(), "E003");
        assert_eq!(EvalSystemError::database_operation("test").code(), "E008");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            EvalSystemError::validation("x").kind(),
            ErrorKind::Validation
        );
        assert_eq!(EvalSystemError::conflict("x").kind(), ErrorKind::Conflict);
        assert_eq!(
            EvalSystemError::authorization("x").kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(
            EvalSystemError::database_connection("x").kind(),
            ErrorKind::Internal
        );
        assert_eq!(
            EvalSystemError::storage_plugin_not_found("x").kind(),
            ErrorKind::Internal
        );
        assert_eq!(
            EvalSystemError::concurrent_modification("x").kind(),
            ErrorKind::Conflict
        );
    }

    #[test]
    fn test_db_error_is_internal() {
        let err: EvalSystemError = sea_orm::DbErr::Custom("boom".into()).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.message().contains("boom"));
    }

    #[test]
    fn test_format_simple() {
        let err = EvalSystemError::validation("Question 3 is not active");
        let formatted = err.format_simple();
        assert!(formatted.contains("Validation Error"));
        assert!(formatted.contains("Question 3 is not active"));
    }
}
