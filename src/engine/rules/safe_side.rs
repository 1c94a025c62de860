// ==========================================
// 安全侧规则
// ==========================================
// 每个托盘可分配到任意装得下的车位（已装载车位 + 空车位, 跨车位号）
// 枚举分配组合（上限 MaxSafeSideCombinations）, 以 安全占用/总占用 评分
// 仅当找到严格更优的分配时才移动托盘, 否则不做修改
// ==========================================

use crate::config::{config_keys, defaults};
use crate::domain::mounted::MountedSpaceId;
use crate::domain::space::SpaceKey;
use crate::domain::types::{SafeSide, SpaceSide};
use crate::engine::context::PalletizeContext;
use crate::engine::domain_operations::DomainOperations;
use crate::engine::error::{PalletizeError, PalletizeResult};
use crate::engine::rule::{BaseRule, Rule};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, info};

pub struct SafeSideRule {
    base: BaseRule,
    ops: DomainOperations,
}

/// (安全占用, 总占用)
type Score = (Decimal, Decimal);

/// 托盘的一个可选车位
#[derive(Debug, Clone, Copy)]
struct SlotOption {
    slot: usize,
    score: Score,
}

/// 一个已装载托盘及其可选车位（安全侧优先, 当前车位其次）
#[derive(Debug, Clone)]
struct Candidate {
    current: SpaceKey,
    options: Vec<SlotOption>,
}

/// 托盘放在某侧时的评分
fn placed_score(safe_side: SafeSide, side: SpaceSide, occupation: Decimal) -> Score {
    if safe_side.accepts(side) {
        (occupation, occupation)
    } else {
        (Decimal::ZERO, occupation)
    }
}

fn add(a: Score, b: Score) -> Score {
    (a.0 + b.0, a.1 + b.1)
}

fn ratio(score: Score) -> Decimal {
    if score.1 <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        score.0 / score.1
    }
}

fn mounted_space_at(ctx: &PalletizeContext, key: SpaceKey) -> PalletizeResult<MountedSpaceId> {
    ctx.mounted_space_by_key(key)
        .map(|ms| ms.id)
        .ok_or(PalletizeError::SpaceNotAvailable(key))
}

impl SafeSideRule {
    pub fn new() -> Self {
        Self {
            base: BaseRule::gated("SafeSideRule", config_keys::ENABLE_SAFE_SIDE_RULE, false),
            ops: DomainOperations::new(),
        }
    }

    /// 全部车位: 有占用托盘所在车位 + 空车位
    fn slots(ctx: &PalletizeContext) -> Vec<(SpaceKey, Decimal)> {
        let mut slots: Vec<(SpaceKey, Decimal)> = ctx
            .mounted_spaces_with_occupation()
            .into_iter()
            .map(|ms| (ms.key(), ms.size()))
            .chain(ctx.spaces().into_iter().map(|s| (s.key(), s.size)))
            .collect();
        slots.sort_by(|a, b| a.0.cmp(&b.0));
        slots.dedup_by(|a, b| a.0 == b.0);
        slots
    }

    fn candidates(
        &self,
        ctx: &PalletizeContext,
        slots: &[(SpaceKey, Decimal)],
    ) -> PalletizeResult<(Vec<Candidate>, Score)> {
        let mut candidates = Vec::new();
        let mut current_score = (Decimal::ZERO, Decimal::ZERO);
        for ms in ctx.mounted_spaces_with_occupation() {
            let safe_side = ctx.mounted_space_safe_side(ms.id)?;
            let current = ms.key();
            current_score = add(current_score, placed_score(safe_side, current.side, ms.occupation));

            let mut options = Vec::new();
            for (index, (key, size)) in slots.iter().enumerate() {
                let occupation = if *key == current {
                    ms.occupation
                } else {
                    let occupation = self.ops.recomputed_occupation(ctx, ms.id, *size)?;
                    if occupation > *size {
                        continue;
                    }
                    occupation
                };
                options.push(SlotOption {
                    slot: index,
                    score: placed_score(safe_side, key.side, occupation),
                });
            }
            options.sort_by(|a, b| {
                let a_safe = a.score.0 > Decimal::ZERO;
                let b_safe = b.score.0 > Decimal::ZERO;
                b_safe
                    .cmp(&a_safe)
                    .then_with(|| (slots[b.slot].0 == current).cmp(&(slots[a.slot].0 == current)))
                    .then(a.slot.cmp(&b.slot))
            });
            candidates.push(Candidate { current, options });
        }
        Ok((candidates, current_score))
    }

    /// 深度优先枚举托盘到车位的分配, 每个车位最多一个托盘
    fn search(&self, candidates: &[Candidate], slot_count: usize, limit: usize) -> Option<(Vec<usize>, Decimal)> {
        struct State<'a> {
            candidates: &'a [Candidate],
            limit: usize,
            evaluated: usize,
            steps: usize,
            max_steps: usize,
            assignment: Vec<usize>,
            used: Vec<bool>,
            best: Option<(Vec<usize>, Decimal)>,
        }

        fn visit(state: &mut State<'_>, index: usize, score: Score) {
            if state.evaluated >= state.limit || state.steps >= state.max_steps {
                return;
            }
            state.steps += 1;
            if index == state.candidates.len() {
                state.evaluated += 1;
                let r = ratio(score);
                if state.best.as_ref().map_or(true, |(_, b)| r > *b) {
                    state.best = Some((state.assignment.clone(), r));
                }
                return;
            }
            let candidate = &state.candidates[index];
            for option in &candidate.options {
                if state.used[option.slot] {
                    continue;
                }
                state.used[option.slot] = true;
                state.assignment.push(option.slot);
                visit(state, index + 1, add(score, option.score));
                state.assignment.pop();
                state.used[option.slot] = false;
            }
        }

        let mut state = State {
            candidates,
            limit,
            evaluated: 0,
            steps: 0,
            max_steps: limit.saturating_mul(candidates.len() + 1),
            assignment: Vec::with_capacity(candidates.len()),
            used: vec![false; slot_count],
            best: None,
        };
        visit(&mut state, 0, (Decimal::ZERO, Decimal::ZERO));
        debug!(evaluated = state.evaluated, steps = state.steps, "安全侧组合枚举");
        state.best
    }

    /// 按目标车位移动托盘内容; 目标被另一托盘占用时两者对调
    fn apply(&self, ctx: &mut PalletizeContext, moves: &[(SpaceKey, SpaceKey)]) -> PalletizeResult<usize> {
        // 内容（以原车位标识）当前所在车位, 以及车位上当前的内容
        let mut location: BTreeMap<SpaceKey, SpaceKey> = BTreeMap::new();
        let mut occupant: BTreeMap<SpaceKey, SpaceKey> = BTreeMap::new();
        for (origin, _) in moves {
            location.insert(*origin, *origin);
            occupant.insert(*origin, *origin);
        }

        let mut operations = 0usize;
        for (origin, target) in moves {
            let at = location.get(origin).copied().unwrap_or(*origin);
            if at == *target {
                continue;
            }
            let source = mounted_space_at(ctx, at)?;
            match occupant.get(target).copied() {
                Some(other) => {
                    ctx.switch_products(source, mounted_space_at(ctx, *target)?)?;
                    location.insert(other, at);
                    occupant.insert(at, other);
                }
                None => {
                    ctx.move_mounted_space_to_space(source, *target)?;
                    occupant.remove(&at);
                }
            }
            location.insert(*origin, *target);
            occupant.insert(*target, *origin);
            operations += 1;
        }
        Ok(operations)
    }
}

impl Default for SafeSideRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for SafeSideRule {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn should_execute(&self, ctx: &PalletizeContext) -> bool {
        self.base.is_enabled(ctx) && !ctx.mounted_spaces_with_occupation().is_empty()
    }

    fn execute(&self, ctx: &mut PalletizeContext) -> PalletizeResult<()> {
        let limit: usize = ctx.get_setting(
            config_keys::MAX_SAFE_SIDE_COMBINATIONS,
            defaults::MAX_SAFE_SIDE_COMBINATIONS,
        );
        let slots = Self::slots(ctx);
        let (candidates, current_score) = self.candidates(ctx, &slots)?;
        let current = ratio(current_score);

        let Some((assignment, best)) = self.search(&candidates, slots.len(), limit.max(1)) else {
            return Ok(());
        };
        if best <= current {
            debug!(current = %current, "没有更优的安全侧组合");
            return Ok(());
        }

        let moves: Vec<(SpaceKey, SpaceKey)> = candidates
            .iter()
            .zip(assignment)
            .map(|(c, slot)| (c.current, slots[slot].0))
            .filter(|(from, to)| from != to)
            .collect();
        let operations = self.apply(ctx, &moves)?;
        info!(moved = moves.len(), operations, before = %current, after = %best, "安全侧调整完成");
        Ok(())
    }
}
