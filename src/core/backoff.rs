//! 退避策略
//!
//! 根据 ResearchError 的类别与当前 RetryState 给出 RetryDecision：
//! 可重试的失败在 [min_delay, max_delay] 内均匀抽样一个等待时长，超过 max_retries 后放弃；
//! 确定性失败（Fatal）不等待直接放弃，只有配置类失败才作为错误返回。

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{BackoffSection, MAX_BACKOFF_DELAY_SECS};
use crate::core::{FailureKind, ResearchError};

const MAX_BACKOFF_DELAY: Duration = Duration::from_secs(MAX_BACKOFF_DELAY_SECS as u64);

/// 单次调用链内的重试状态（不跨调用保存）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetryState {
    /// 已执行的重试次数
    pub attempt: u32,
    /// 最近一次抽样的等待时长
    pub last_delay: Option<Duration>,
}

/// 策略给出的动作
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    /// 等待后再调用一次
    RetryAfter(Duration),
    /// 次数已用尽或重试无意义：降级为空结果
    GiveUp,
    /// 不可重试（凭据 / 参数等）：直接返回错误
    Fail,
}

/// 可注入的退避策略；seed 固定时抽样可复现（测试用）
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub max_retries: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub seed: Option<u64>,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            min_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(30),
            seed: None,
        }
    }
}

impl From<&BackoffSection> for BackoffPolicy {
    fn from(section: &BackoffSection) -> Self {
        Self {
            max_retries: section.max_retries,
            min_delay: secs(section.min_delay_secs),
            max_delay: secs(section.max_delay_secs),
            seed: section.seed,
        }
    }
}

/// 负数与 NaN 按 0 处理，过大或无穷截断到 MAX_BACKOFF_DELAY；校验由 AppConfig::validate 负责
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0))
        .unwrap_or(MAX_BACKOFF_DELAY)
        .min(MAX_BACKOFF_DELAY)
}

impl BackoffPolicy {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_delays(mut self, min_delay: Duration, max_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self.max_delay = max_delay;
        self
    }

    /// 每条调用链新建一个随机源
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// 在 [min_delay, max_delay] 内均匀抽样
    pub fn sample_delay<R: Rng>(&self, rng: &mut R) -> Duration {
        let (lo, hi) = if self.min_delay <= self.max_delay {
            (self.min_delay, self.max_delay)
        } else {
            (self.max_delay, self.min_delay)
        };
        if lo == hi {
            return lo;
        }
        let secs = rng.gen_range(lo.as_secs_f64()..=hi.as_secs_f64());
        Duration::from_secs_f64(secs).clamp(lo, hi)
    }

    /// 根据错误类别与重试状态决定下一步；返回 RetryAfter 时已更新 state
    pub fn decide<R: Rng>(
        &self,
        err: &ResearchError,
        state: &mut RetryState,
        rng: &mut R,
    ) -> RetryDecision {
        match err.kind() {
            FailureKind::Configuration => return RetryDecision::Fail,
            FailureKind::Fatal => return RetryDecision::GiveUp,
            FailureKind::Transient => {}
        }
        if state.attempt >= self.max_retries {
            return RetryDecision::GiveUp;
        }
        let delay = self.sample_delay(rng);
        state.attempt += 1;
        state.last_delay = Some(delay);
        RetryDecision::RetryAfter(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampled_delay_within_bounds() {
        let policy = BackoffPolicy::default();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let delay = policy.sample_delay(&mut rng);
            assert!(delay >= Duration::from_secs(10), "seed {seed}: {delay:?}");
            assert!(delay <= Duration::from_secs(30), "seed {seed}: {delay:?}");
        }
    }

    #[test]
    fn test_seeded_policy_is_deterministic() {
        let policy = BackoffPolicy::default().with_seed(42);
        let a = policy.sample_delay(&mut policy.rng());
        let b = policy.sample_delay(&mut policy.rng());
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_retry_then_give_up() {
        let policy = BackoffPolicy::default().with_seed(7);
        let mut rng = policy.rng();
        let mut state = RetryState::default();
        let err = ResearchError::RateLimited("duckduckgo".to_string());

        match policy.decide(&err, &mut state, &mut rng) {
            RetryDecision::RetryAfter(delay) => {
                assert!(delay >= policy.min_delay && delay <= policy.max_delay);
                assert_eq!(state.last_delay, Some(delay));
            }
            other => panic!("Expected RetryAfter, got {other:?}"),
        }
        assert_eq!(state.attempt, 1);
        assert_eq!(
            policy.decide(&err, &mut state, &mut rng),
            RetryDecision::GiveUp
        );
        assert_eq!(state.attempt, 1);
    }

    #[test]
    fn test_configuration_error_is_not_retried() {
        let policy = BackoffPolicy::default();
        let mut state = RetryState::default();
        let err = ResearchError::MissingCredential("SERPAPI_API_KEY");
        assert_eq!(
            policy.decide(&err, &mut state, &mut policy.rng()),
            RetryDecision::Fail
        );
        assert_eq!(state, RetryState::default());
    }

    #[test]
    fn test_fatal_error_gives_up_without_sleeping() {
        let policy = BackoffPolicy::default();
        let mut state = RetryState::default();
        let err = ResearchError::Http {
            provider: "serpapi".to_string(),
            status: 404,
        };
        assert_eq!(
            policy.decide(&err, &mut state, &mut policy.rng()),
            RetryDecision::GiveUp
        );
        assert_eq!(state, RetryState::default());
    }

    #[test]
    fn test_oversized_delays_do_not_panic() {
        let section = BackoffSection {
            min_delay_secs: 1e20,
            max_delay_secs: f64::INFINITY,
            ..BackoffSection::default()
        };
        let policy = BackoffPolicy::from(&section);
        assert_eq!(policy.min_delay, MAX_BACKOFF_DELAY);
        assert_eq!(policy.max_delay, MAX_BACKOFF_DELAY);
    }

    #[test]
    fn test_inverted_bounds_are_tolerated() {
        let policy = BackoffPolicy::default()
            .with_delays(Duration::from_secs(30), Duration::from_secs(10))
            .with_seed(1);
        let delay = policy.sample_delay(&mut policy.rng());
        assert!(delay >= Duration::from_secs(10) && delay <= Duration::from_secs(30));
    }
}
