// ==========================================
// 装配顺序规则
// ==========================================
// 不移动商品, 只为每个容器内的已装载商品分配 AssemblySequence（从 1 开始）
// 阶段顺序: 整层 -> 托盘底层 -> 生啤 -> 可回收 -> 一次性 -> 等渗水 -> 托盘顶层 -> 电商包裹
// 阶段内排序:
//   整层: 层号升序, 占用降序
//   底层/顶层: 占用降序
//   生啤/等渗水/电商包裹: 数量降序
//   可回收/一次性: 同分组合计占用降序, 占用降序
// 最终平局: 商品代码升序, 已装载商品 id 升序
// 红线: 结果只依赖商品属性, 重复执行序号不变
// ==========================================

use crate::config::config_keys;
use crate::domain::mounted::{ContainerId, MountedProduct, MountedProductId};
use crate::domain::product::Product;
use crate::engine::context::PalletizeContext;
use crate::engine::error::PalletizeResult;
use crate::engine::rule::{BaseRule, Rule};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

/// 装配阶段（声明顺序即装配顺序）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AssemblyStage {
    Layer,
    BasePallet,
    Chopp,
    Returnable,
    Disposable,
    IsotonicWater,
    TopOfPallet,
    Marketplace,
}

impl AssemblyStage {
    /// 归类优先级: 整层 > 底层 > 生啤 > 电商包裹 > 顶层 > 等渗水 > 可回收 > 一次性
    pub fn classify(mp: &MountedProduct, product: &Product) -> Self {
        if mp.is_layer_product() {
            AssemblyStage::Layer
        } else if product.is_base_pallet {
            AssemblyStage::BasePallet
        } else if product.is_chopp {
            AssemblyStage::Chopp
        } else if product.is_marketplace_package {
            AssemblyStage::Marketplace
        } else if product.is_top_of_pallet {
            AssemblyStage::TopOfPallet
        } else if product.is_isotonic_water {
            AssemblyStage::IsotonicWater
        } else if product.is_returnable() {
            AssemblyStage::Returnable
        } else {
            AssemblyStage::Disposable
        }
    }
}

struct Entry {
    id: MountedProductId,
    stage: AssemblyStage,
    code: u32,
    group: u32,
    layer: u32,
    amount: u32,
    occupation: Decimal,
    group_occupation: Decimal,
}

fn compare(a: &Entry, b: &Entry) -> Ordering {
    let stage = a.stage.cmp(&b.stage);
    if stage != Ordering::Equal {
        return stage;
    }
    let within = match a.stage {
        AssemblyStage::Layer => a.layer.cmp(&b.layer).then(b.occupation.cmp(&a.occupation)),
        AssemblyStage::BasePallet | AssemblyStage::TopOfPallet => b.occupation.cmp(&a.occupation),
        AssemblyStage::Chopp | AssemblyStage::IsotonicWater | AssemblyStage::Marketplace => {
            b.amount.cmp(&a.amount)
        }
        AssemblyStage::Returnable | AssemblyStage::Disposable => b
            .group_occupation
            .cmp(&a.group_occupation)
            .then(a.group.cmp(&b.group))
            .then(b.occupation.cmp(&a.occupation)),
    };
    within.then(a.code.cmp(&b.code)).then(a.id.cmp(&b.id))
}

pub struct ReorderRule {
    base: BaseRule,
}

impl ReorderRule {
    pub fn new() -> Self {
        Self {
            base: BaseRule::gated("ReorderRule", config_keys::ENABLE_REORDER_RULE, true),
        }
    }

    /// 计算一个容器的装配顺序
    pub fn sequence_of(ctx: &PalletizeContext, container: ContainerId) -> PalletizeResult<Vec<MountedProductId>> {
        let mut entries = Vec::new();
        for id in &ctx.container(container)?.products {
            let mp = ctx.mounted_product(*id)?;
            let product = &ctx.item(mp.item)?.product;
            entries.push(Entry {
                id: mp.id,
                stage: AssemblyStage::classify(mp, product),
                code: mp.product_code,
                group: product.packing_group.group_code,
                layer: mp.layer,
                amount: mp.amount,
                occupation: mp.occupation,
                group_occupation: Decimal::ZERO,
            });
        }

        let mut group_totals: BTreeMap<(AssemblyStage, u32), Decimal> = BTreeMap::new();
        for e in &entries {
            *group_totals.entry((e.stage, e.group)).or_insert(Decimal::ZERO) += e.occupation;
        }
        for e in &mut entries {
            e.group_occupation = group_totals
                .get(&(e.stage, e.group))
                .copied()
                .unwrap_or(Decimal::ZERO);
        }

        entries.sort_by(compare);
        Ok(entries.into_iter().map(|e| e.id).collect())
    }
}

impl Default for ReorderRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for ReorderRule {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn should_execute(&self, ctx: &PalletizeContext) -> bool {
        self.base.is_enabled(ctx) && !ctx.mounted_spaces_with_occupation().is_empty()
    }

    fn execute(&self, ctx: &mut PalletizeContext) -> PalletizeResult<()> {
        let containers: Vec<ContainerId> = ctx
            .mounted_spaces()
            .iter()
            .flat_map(|ms| ms.containers.iter().copied())
            .collect();
        for container in containers {
            let order = Self::sequence_of(ctx, container)?;
            for (index, mp) in order.iter().enumerate() {
                ctx.set_assembly_sequence(*mp, index as u32 + 1)?;
            }
            debug!(container = container.0, products = order.len(), "装配顺序");
        }
        Ok(())
    }
}
