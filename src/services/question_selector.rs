//! 选题服务 - 业务能力层
//!
//! 只负责"从某一等级挑出若干未用过的题目"，不修改已用集合

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

use crate::models::level::Level;
use crate::models::question::Question;

/// 从题库中随机挑选 `level_index` 等级下未使用的题目
///
/// # 参数
/// - `all`: 全部题目
/// - `level_index`: 等级下标（越界时饱和到两端）
/// - `used`: 已展示过的题目编号，不会被修改
/// - `count`: 最多挑选的题数
/// - `rng`: 随机数源
///
/// # 返回
/// 返回长度为 `min(count, 可用数量)` 的随机子集；该等级题目耗尽时返回空列表
pub fn select_questions<'a, R: Rng + ?Sized>(
    all: &'a [Question],
    level_index: usize,
    used: &HashSet<usize>,
    count: usize,
    rng: &mut R,
) -> Vec<&'a Question> {
    let level = Level::from_index(level_index);
    let mut pool: Vec<&Question> = all
        .iter()
        .filter(|q| q.level == level && !used.contains(&q.id))
        .collect();

    pool.shuffle(rng);
    pool.truncate(count);
    pool
}

/// 打乱选项顺序，每次展示题目时调用
pub fn shuffled_options<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> Vec<String> {
    let mut options = question.options.clone();
    options.shuffle(rng);
    options
}
