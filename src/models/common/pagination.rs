//! 分页游标
//!
//! 两种可互换的策略共用同一份结果结构 [`Page`]：
//! - 文档游标：按稳定排序键取 `page_size + 1` 行，从游标所指行之后继续；
//! - 偏移分页：`LIMIT page_size + 1 OFFSET (page - 1) * page_size`，游标即页码。
//!
//! 多取的一行只用于判断 `has_next`，不会返回给调用方。
//! `page_size < 0` 表示不分页，直接返回整个有序集合。

use serde::{Deserialize, Serialize};

use crate::errors::{EvalSystemError, Result};

pub const DEFAULT_PAGE_SIZE: i64 = 10;

// 分页查询参数
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(
        default = "default_page_size",
        deserialize_with = "deserialize_string_to_i64"
    )]
    pub page_size: i64,
}

/// 解析后的页大小
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
    /// 不分页
    All,
    Limited(u64),
}

impl PageRequest {
    pub fn new(cursor: Option<String>, page_size: i64) -> Self {
        Self { cursor, page_size }
    }

    /// 第一页
    pub fn first(page_size: i64) -> Self {
        Self::new(None, page_size)
    }

    /// 从上一页返回的游标继续
    pub fn after(cursor: impl Into<String>, page_size: i64) -> Self {
        Self::new(Some(cursor.into()), page_size)
    }

    pub fn size(&self) -> Result<PageSize> {
        match self.page_size {
            0 => Err(EvalSystemError::validation(
                "page_size must be positive, or negative to disable pagination",
            )),
            n if n < 0 => Ok(PageSize::All),
            n => Ok(PageSize::Limited(n as u64)),
        }
    }

    /// 实际需要读取的行数（多读一行用于判断是否还有下一页）
    pub fn fetch_limit(&self) -> Result<Option<u64>> {
        Ok(match self.size()? {
            PageSize::All => None,
            PageSize::Limited(n) => Some((n + 1).min(i64::MAX as u64)),
        })
    }

    /// 偏移分页下的页码，游标缺省为第 1 页
    pub fn page_number(&self) -> Result<u64> {
        match self.cursor.as_deref() {
            None | Some("") => Ok(1),
            Some(raw) => match raw.parse::<u64>() {
                Ok(page) if page >= 1 => Ok(page),
                _ => Err(EvalSystemError::validation(format!(
                    "Invalid page cursor: '{raw}'"
                ))),
            },
        }
    }

    /// 偏移分页下跳过的行数
    pub fn offset(&self) -> Result<u64> {
        Ok(match self.size()? {
            PageSize::All => 0,
            PageSize::Limited(n) => {
                let page = self.page_number()?;
                (page - 1)
                    .checked_mul(n)
                    .filter(|offset| *offset <= i64::MAX as u64)
                    .ok_or_else(|| {
                        EvalSystemError::validation(format!("Page cursor out of range: {page}"))
                    })?
            }
        })
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

/// 分页结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
    pub has_next: bool,
}

impl<T> Page<T> {
    /// 由文档游标策略读出的行构造页面
    ///
    /// `rows` 最多 `page_size + 1` 行；`next_cursor` 取倒数第二行，
    /// 即本页最后一个返回项。
    pub fn from_cursor_rows<F>(mut rows: Vec<T>, size: PageSize, cursor_of: F) -> Self
    where
        F: Fn(&T) -> String,
    {
        match size {
            PageSize::All => Self::unpaginated(rows),
            PageSize::Limited(n) => {
                let has_next = rows.len() as u64 > n;
                let next_cursor = if has_next {
                    rows.get(rows.len() - 2).map(&cursor_of)
                } else {
                    None
                };
                rows.truncate(n as usize);
                Self {
                    items: rows,
                    next_cursor,
                    has_next,
                }
            }
        }
    }

    /// 由偏移策略读出的行构造页面，游标为下一页页码
    pub fn from_offset_rows(mut rows: Vec<T>, size: PageSize, page: u64) -> Self {
        match size {
            PageSize::All => Self::unpaginated(rows),
            PageSize::Limited(n) => {
                let has_next = rows.len() as u64 > n;
                rows.truncate(n as usize);
                Self {
                    items: rows,
                    next_cursor: has_next.then(|| (page + 1).to_string()),
                    has_next,
                }
            }
        }
    }

    fn unpaginated(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
            has_next: false,
        }
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
            has_next: self.has_next,
        }
    }
}

/// 在已排序的内存集合上执行文档游标分页
///
/// 游标找不到对应行时从头开始（与文档库 `startAfter` 缺失文档时的行为一致）。
pub fn paginate_after<T, F>(ordered: Vec<T>, request: &PageRequest, cursor_of: F) -> Result<Page<T>>
where
    F: Fn(&T) -> String,
{
    let size = request.size()?;
    let start = match (size, request.cursor.as_deref()) {
        (PageSize::Limited(_), Some(cursor)) => ordered
            .iter()
            .position(|item| cursor_of(item) == cursor)
            .map(|pos| pos + 1)
            .unwrap_or(0),
        _ => 0,
    };

    let rest = ordered.into_iter().skip(start);
    let rows: Vec<T> = match size {
        PageSize::All => rest.collect(),
        PageSize::Limited(n) => rest.take(n as usize + 1).collect(),
    };

    Ok(Page::from_cursor_rows(rows, size, cursor_of))
}

/// 在已排序的内存集合上执行偏移分页
pub fn paginate_offset<T>(ordered: Vec<T>, request: &PageRequest) -> Result<Page<T>> {
    let size = request.size()?;
    let page = request.page_number()?;
    let rows: Vec<T> = match size {
        PageSize::All => ordered,
        PageSize::Limited(n) => ordered
            .into_iter()
            .skip(request.offset()? as usize)
            .take(n as usize + 1)
            .collect(),
    };

    Ok(Page::from_offset_rows(rows, size, page))
}

// 自定义反序列化函数，支持字符串到i64的转换
fn deserialize_string_to_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{Error, Unexpected, Visitor};
    use std::fmt;

    struct I64Visitor;

    impl<'de> Visitor<'de> for I64Visitor {
        type Value = i64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer or a string containing an integer")
        }

        fn visit_i64<E>(self, value: i64) -> std::result::Result<Self::Value, E>
        where
            E: Error,
        {
            Ok(value)
        }

        fn visit_u64<E>(self, value: u64) -> std::result::Result<Self::Value, E>
        where
            E: Error,
        {
            if value <= i64::MAX as u64 {
                Ok(value as i64)
            } else {
                Err(Error::invalid_value(Unexpected::Unsigned(value), &self))
            }
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
        where
            E: Error,
        {
            value
                .parse()
                .map_err(|_| Error::invalid_value(Unexpected::Str(value), &self))
        }
    }

    deserializer.deserialize_any(I64Visitor)
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn ids(n: i64) -> Vec<i64> {
        (1..=n).collect()
    }

    fn key(id: &i64) -> String {
        id.to_string()
    }

    #[test]
    fn test_cursor_pages_walk_whole_collection() {
        let first = paginate_after(ids(7), &PageRequest::first(3), key).unwrap();
        assert_eq!(first.items, vec![1, 2, 3]);
        assert!(first.has_next);
        assert_eq!(first.next_cursor.as_deref(), Some("3"));

        let second = paginate_after(ids(7), &PageRequest::after("3", 3), key).unwrap();
        assert_eq!(second.items, vec![4, 5, 6]);
        assert!(second.has_next);

        let last = paginate_after(ids(7), &PageRequest::after("6", 3), key).unwrap();
        assert_eq!(last.items, vec![7]);
        assert!(!last.has_next);
        assert_eq!(last.next_cursor, None);
    }

    #[test]
    fn test_exact_multiple_has_no_phantom_page() {
        let page = paginate_after(ids(6), &PageRequest::after("3", 3), key).unwrap();
        assert_eq!(page.items, vec![4, 5, 6]);
        assert!(!page.has_next);
    }

    #[test]
    fn test_negative_page_size_returns_everything() {
        let page = paginate_after(ids(25), &PageRequest::after("4", -1), key).unwrap();
        assert_eq!(page.items.len(), 25);
        assert!(!page.has_next);
        assert_eq!(page.next_cursor, None);

        let page = paginate_offset(ids(25), &PageRequest::first(-1)).unwrap();
        assert_eq!(page.items.len(), 25);
        assert!(!page.has_next);
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let err = paginate_after(ids(3), &PageRequest::first(0), key).unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Validation);
    }

    #[test]
    fn test_unknown_cursor_restarts_from_beginning() {
        let page = paginate_after(ids(5), &PageRequest::after("99", 2), key).unwrap();
        assert_eq!(page.items, vec![1, 2]);
    }

    #[test]
    fn test_offset_pages() {
        let first = paginate_offset(ids(5), &PageRequest::first(2)).unwrap();
        assert_eq!(first.items, vec![1, 2]);
        assert_eq!(first.next_cursor.as_deref(), Some("2"));

        let third = paginate_offset(ids(5), &PageRequest::after("3", 2)).unwrap();
        assert_eq!(third.items, vec![5]);
        assert!(!third.has_next);
    }

    #[test]
    fn test_offset_rejects_bad_page_cursor() {
        assert!(PageRequest::after("0", 2).page_number().is_err());
        assert!(PageRequest::after("abc", 2).page_number().is_err());
        assert_eq!(PageRequest::after("4", 10).offset().unwrap(), 30);
    }

    #[test]
    fn test_offset_rejects_overflowing_page_cursor() {
        let req = PageRequest::after(u64::MAX.to_string(), 10);
        assert_eq!(req.offset().unwrap_err().kind(), ErrorKind::Validation);

        let req = PageRequest::after((i64::MAX as u64 / 10 + 2).to_string(), 10);
        assert_eq!(req.offset().unwrap_err().kind(), ErrorKind::Validation);

        assert_eq!(
            PageRequest::first(i64::MAX).fetch_limit().unwrap(),
            Some(i64::MAX as u64)
        );
    }

    #[test]
    fn test_page_request_accepts_string_size() {
        let req: PageRequest =
            serde_json::from_str(r#"{"cursor":"12","page_size":"5"}"#).unwrap();
        assert_eq!(req, PageRequest::after("12", 5));

        let req: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.page_size, DEFAULT_PAGE_SIZE);
    }
}
