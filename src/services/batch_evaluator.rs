//! 批次判定服务 - 业务能力层
//!
//! 只看当前批次的对错计数，不关心等级和会话状态

pub use crate::models::assessment::Verdict;

/// 根据当前批次的对错数给出判定
///
/// 每答一题都会调用一次，判定可以在批次中途触发
///
/// # 参数
/// - `correct`: 本批答对数
/// - `wrong`: 本批答错数（跳过也算错）
/// - `asked`: 本批已答题数
///
/// # 返回
/// 返回 promote / demote / undecided 之一，两条升降规则互斥
pub fn evaluate_batch(correct: usize, wrong: usize, asked: usize) -> Verdict {
    if asked == 0 {
        return Verdict::Undecided;
    }
    if wrong >= 2 && correct < 3 {
        return Verdict::Demote;
    }
    if correct >= 3 && wrong <= 2 {
        return Verdict::Promote;
    }
    Verdict::Undecided
}
