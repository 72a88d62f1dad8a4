//! 启用问题的稠密排序
//!
//! 每次启用、停用或调整位置后，对全部启用问题重新排名：
//! 排序键为 `(已存 order 升序且 None 排最后, 刚变更的问题优先, id 升序)`，
//! 然后按 1 起的名次重新赋值。只有名次与已存值不同的行需要写回。

use std::cmp::Ordering;

/// 参与排名的启用问题
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedQuestion {
    pub id: i64,
    pub order: Option<i32>,
}

/// 需要写回的新位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderChange {
    pub id: i64,
    pub order: i32,
}

fn rank_key(a: &RankedQuestion, b: &RankedQuestion, priority: Option<i64>) -> Ordering {
    let by_order = match (a.order, b.order) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    let is_priority = |q: &RankedQuestion| Some(q.id) == priority;
    by_order
        .then_with(|| is_priority(b).cmp(&is_priority(a)))
        .then_with(|| a.id.cmp(&b.id))
}

/// 计算重排结果，返回需要写回的行（按新位置升序）
///
/// `active` 只能包含启用的问题；`priority` 是本次刚变更的问题，
/// 它与其他问题 order 相同时排在前面。
pub fn resequence(active: &[RankedQuestion], priority: Option<i64>) -> Vec<OrderChange> {
    let mut ranked = active.to_vec();
    ranked.sort_by(|a, b| rank_key(a, b, priority));

    ranked
        .iter()
        .enumerate()
        .filter_map(|(idx, q)| {
            let order = idx as i32 + 1;
            (q.order != Some(order)).then_some(OrderChange { id: q.id, order })
        })
        .collect()
}

/// 启用问题的 order 是否恰好为 1..=N
pub fn is_dense<I>(orders: I) -> bool
where
    I: IntoIterator<Item = Option<i32>>,
{
    let mut seen: Vec<i32> = Vec::new();
    for order in orders {
        match order {
            Some(o) => seen.push(o),
            None => return false,
        }
    }
    seen.sort_unstable();
    seen.iter().enumerate().all(|(idx, o)| *o == idx as i32 + 1)
}
