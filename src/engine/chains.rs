// ==========================================
// 车辆托盘装载引擎 - 具名规则链
// ==========================================
// 每种地图类型一条规则链, 阶段相同时共用
// route:         合并 -> 装载 -> 整理 -> 拆分回挂 -> 收尾
// as:            每个订单独立装载与整理（专属托盘） -> 收尾
// mixed:         每个订单的整层/生啤（专属托盘） -> 共享托盘装载与整理 -> 收尾
// cross_docking: 按支撑点分组装载与整理 -> 收尾
// t4:            精简规则集
// common:        装载 -> 整理 -> 收尾
// ==========================================

use crate::domain::types::MapKind;
use crate::engine::rule_chain::RuleChain;
use crate::engine::rules::{
    ChangeProductsRule, ChoppRule, ComputePalletsNeededRule, DetachedUnitsRule,
    JoinGroupedSpacesRule, LayerRule, MergeOrdersRule, NonPalletizedRule, OrderGrouping,
    PalletEqualizationRule, PalletGroupRule, PalletGroupSubGroupRule, PerOrderRule,
    RemainingItemsRule, ReorderRule, SafeSideRule, SplitItemsRule, UnmergeOrdersRule,
};

/// 专属装载阶段: 整层 -> 生啤
fn dedicated(chain: RuleChain) -> RuleChain {
    chain.rule(LayerRule::new()).rule(ChoppRule::new())
}

/// 通用装载阶段: 子分组 -> 分组 -> 拆分 -> 剩余 -> 散件
fn general(chain: RuleChain) -> RuleChain {
    chain
        .rule(PalletGroupSubGroupRule::new())
        .rule(PalletGroupRule::new())
        .rule(SplitItemsRule::new())
        .rule(RemainingItemsRule::new())
        .rule(DetachedUnitsRule::new())
}

/// 整理阶段: 合并 -> 调换 -> 均衡
fn consolidation(chain: RuleChain) -> RuleChain {
    chain
        .rule(JoinGroupedSpacesRule::new())
        .rule(ChangeProductsRule::new())
        .rule(PalletEqualizationRule::new())
}

/// 收尾阶段: 安全侧 -> 记录未装载 -> 装配顺序
fn finishing(chain: RuleChain) -> RuleChain {
    chain
        .rule(SafeSideRule::new())
        .rule(NonPalletizedRule::new())
        .rule(ReorderRule::new())
}

pub fn route() -> RuleChain {
    let chain = RuleChain::new("route")
        .rule(MergeOrdersRule::new())
        .rule(ComputePalletsNeededRule::new());
    let chain = consolidation(general(dedicated(chain))).rule(UnmergeOrdersRule::new());
    finishing(chain)
}

pub fn as_chain() -> RuleChain {
    let per_order = consolidation(general(dedicated(RuleChain::new("as_order"))));
    let chain = RuleChain::new("as")
        .rule(ComputePalletsNeededRule::new())
        .rule(PerOrderRule::new(OrderGrouping::ByOrder, per_order));
    finishing(chain)
}

pub fn mixed() -> RuleChain {
    let per_order = dedicated(RuleChain::new("mixed_order"));
    let shared = consolidation(general(RuleChain::new("mixed_shared")));
    let chain = RuleChain::new("mixed")
        .rule(ComputePalletsNeededRule::new())
        .rule(PerOrderRule::new(OrderGrouping::ByOrder, per_order))
        .rule(PerOrderRule::new(OrderGrouping::SharedPallets, shared));
    finishing(chain)
}

pub fn cross_docking() -> RuleChain {
    let per_point = consolidation(general(dedicated(RuleChain::new("cross_docking_point"))));
    let chain = RuleChain::new("cross_docking")
        .rule(ComputePalletsNeededRule::new())
        .rule(PerOrderRule::new(OrderGrouping::BySupportPoint, per_point));
    finishing(chain)
}

pub fn t4() -> RuleChain {
    RuleChain::new("t4")
        .rule(ComputePalletsNeededRule::new())
        .rule(LayerRule::new())
        .rule(PalletGroupRule::new())
        .rule(RemainingItemsRule::new())
        .rule(DetachedUnitsRule::new())
        .rule(JoinGroupedSpacesRule::new())
        .rule(NonPalletizedRule::new())
        .rule(ReorderRule::new())
}

pub fn common() -> RuleChain {
    let chain = dedicated(RuleChain::new("common").rule(ComputePalletsNeededRule::new()));
    finishing(consolidation(general(chain)))
}

/// 按地图类型选择规则链
pub fn for_kind(kind: MapKind) -> RuleChain {
    match kind {
        MapKind::Route => route(),
        MapKind::As => as_chain(),
        MapKind::Mixed => mixed(),
        MapKind::CrossDocking => cross_docking(),
        MapKind::T4 => t4(),
        MapKind::Common => common(),
    }
}
