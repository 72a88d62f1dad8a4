//! 数据一致性核心
//!
//! 这里只放纯算法，不做任何 I/O：
//! - [`ordering`]：启用问题的稠密 1..N 排序；
//! - [`rating`]：评分的增量平均值维护；
//! - [`scoring`]：评价提交的回答校验与得分计算。
//!
//! 存储适配器在自己的事务内调用这些函数，再把结果写回。

pub mod ordering;
pub mod rating;
pub mod scoring;
