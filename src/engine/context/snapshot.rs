// ==========================================
// 装载上下文 - 快照与派生
// ==========================================
// 快照 = 克隆 ID 表, 恢复 = 整体替换
// 试算在快照或 fork 上进行, 不写回实时上下文
// ==========================================

use crate::domain::item::Item;
use crate::domain::order::Order;
use crate::domain::types::MapKind;

use super::core::{PalletizeContext, PlacementState};
use super::merge::MergeStash;

/// 完整快照: 商品 + 订单 + 装载状态
#[derive(Debug, Clone)]
pub struct ContextSnapshot {
    items: Vec<Item>,
    orders: Vec<Order>,
    state: PlacementState,
    merge_stash: Option<MergeStash>,
}

/// 精简快照: 装载状态 + 各商品剩余计数与不可装载标记
#[derive(Debug, Clone)]
pub struct MinimalSnapshot {
    state: PlacementState,
    remaining: Vec<(u32, u32, Option<String>)>,
}

impl MinimalSnapshot {
    pub fn mounted_space_count(&self) -> usize {
        self.state.mounted_spaces.len()
    }
}

impl PalletizeContext {
    pub fn create_snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            items: self.items.clone(),
            orders: self.orders.clone(),
            state: self.state.clone(),
            merge_stash: self.merge_stash.clone(),
        }
    }

    pub fn restore_snapshot(&mut self, snapshot: ContextSnapshot) {
        self.items = snapshot.items;
        self.orders = snapshot.orders;
        self.state = snapshot.state;
        self.merge_stash = snapshot.merge_stash;
    }

    /// 仅在订单结构不变（未合并/拆分）期间有效
    pub fn create_snapshot_minimal(&self) -> MinimalSnapshot {
        MinimalSnapshot {
            state: self.state.clone(),
            remaining: self
                .items
                .iter()
                .map(|i| {
                    (
                        i.amount_remaining(),
                        i.detached_remaining(),
                        i.non_palletizable_reason().map(str::to_string),
                    )
                })
                .collect(),
        }
    }

    pub fn restore_snapshot_minimal(&mut self, snapshot: MinimalSnapshot) {
        self.state = snapshot.state;
        for (item, (remaining, detached, reason)) in self.items.iter_mut().zip(snapshot.remaining) {
            item.restore_remaining(remaining, detached);
            item.restore_non_palletizable(reason);
        }
    }

    /// 试算用副本（保留过滤）
    pub fn fork(&self) -> PalletizeContext {
        self.clone()
    }

    /// 基于已有上下文派生另一类型的上下文, 保留当前过滤
    pub fn derive_from(other: &PalletizeContext, kind: MapKind) -> PalletizeContext {
        let mut ctx = other.clone();
        ctx.kind = kind;
        ctx
    }
}
