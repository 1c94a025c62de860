// ==========================================
// 装载上下文 - 订单合并/拆分（线路地图）
// ==========================================
// 合并: 所有订单按商品代码汇总为一个虚拟订单, 来源信息保存在 Item.sources
// 拆分: 按来源把已装载商品回挂到原订单商品, 恢复原订单
// 红线: 合并只能在装载开始前进行
// ==========================================

use crate::domain::item::{Item, ItemId, ItemSource};
use crate::domain::mounted::{MountedProduct, MountedProductId, MountedSpaceId};
use crate::domain::order::{Order, OrderId};
use crate::domain::types::SafeSide;
use crate::engine::error::{PalletizeError, PalletizeResult};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use super::core::PalletizeContext;

/// 合并前的原订单
#[derive(Debug, Clone)]
pub struct MergeStash {
    pub(crate) original_orders: Vec<Order>,
    pub(crate) merged_order: OrderId,
}

/// 回挂统计（按匹配策略）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReattachReport {
    pub by_routing: usize,
    pub single_source: usize,
    pub exact_quantity: usize,
    pub first_fit: usize,
    pub splitted: usize,
    pub unresolved: usize,
}

impl ReattachReport {
    pub fn total(&self) -> usize {
        self.by_routing + self.single_source + self.exact_quantity + self.first_fit + self.splitted
    }
}

impl PalletizeContext {
    // ==========================================
    // 合并
    // ==========================================

    /// 把全部订单合并为一个虚拟订单
    ///
    /// # 返回
    /// - `Ok(false)`: 已合并或订单数 <= 1, 无需合并
    /// - `Err(InvalidState)`: 已存在装载商品
    pub fn merge_orders_in_place(&mut self) -> PalletizeResult<bool> {
        if self.is_merged() || self.orders.len() <= 1 {
            return Ok(false);
        }
        if !self.state.products.is_empty() {
            return Err(PalletizeError::InvalidState(
                "装载开始后不能合并订单".to_string(),
            ));
        }

        let mut originals = self.orders.clone();
        originals.sort_by_key(|o| (o.delivery_order, o.id));
        let Some(first) = originals.first() else {
            return Ok(false);
        };

        let merged_id = OrderId(originals.iter().map(|o| o.id.0).max().unwrap_or(0) + 1);
        let mut merged = Order::new(
            merged_id,
            first.delivery_order,
            first.map_number.clone(),
            first.customer_code.clone(),
        );
        merged.support_point = first.support_point.clone();
        merged.license_plate = first.license_plate.clone();
        merged.is_merged = true;

        // 按商品代码分组, 保持首次出现顺序
        let mut codes: Vec<u32> = Vec::new();
        let mut grouped: HashMap<u32, Vec<(ItemId, OrderId)>> = HashMap::new();
        for order in &originals {
            for item_id in &order.items {
                let code = self.item(*item_id)?.code;
                if !grouped.contains_key(&code) {
                    codes.push(code);
                }
                grouped.entry(code).or_default().push((*item_id, order.id));
            }
        }

        for code in codes {
            let members = grouped.remove(&code).unwrap_or_default();
            let merged_item = self.build_merged_item(merged_id, &members, &originals)?;
            merged.items.push(merged_item.id);
            self.items.push(merged_item);
        }

        info!(
            orders = originals.len(),
            merged_order = merged_id.0,
            items = merged.items.len(),
            "合并订单"
        );
        self.orders = vec![merged];
        self.merge_stash = Some(MergeStash {
            original_orders: originals,
            merged_order: merged_id,
        });
        Ok(true)
    }

    fn build_merged_item(
        &self,
        merged_id: OrderId,
        members: &[(ItemId, OrderId)],
        originals: &[Order],
    ) -> PalletizeResult<Item> {
        let first = members
            .first()
            .ok_or_else(|| PalletizeError::InvalidState("合并分组为空".to_string()))?;
        let template = self.item(first.0)?;

        let mut amount = 0u32;
        let mut detached = 0u32;
        let mut delivery_orders: BTreeMap<u32, u32> = BTreeMap::new();
        let mut customer_amounts: BTreeMap<String, u32> = BTreeMap::new();
        let mut additional = Decimal::ZERO;
        let mut safe_sides: Vec<SafeSide> = Vec::new();
        let mut sources = Vec::with_capacity(members.len());

        for (item_id, order_id) in members {
            let item = self.item(*item_id)?;
            let order = originals
                .iter()
                .find(|o| o.id == *order_id)
                .ok_or_else(|| PalletizeError::InvalidState(format!("订单不存在: {:?}", order_id)))?;
            amount += item.amount;
            detached += item.detached_amount;
            for (d, q) in &item.delivery_orders {
                *delivery_orders.entry(*d).or_insert(0) += q;
            }
            for (c, q) in &item.customer_amounts {
                *customer_amounts.entry(c.clone()).or_insert(0) += q;
            }
            additional = additional.max(item.additional_occupation);
            safe_sides.push(item.safe_side);
            sources.push(ItemSource {
                order_id: *order_id,
                item_id: *item_id,
                amount: item.amount,
                routing: order.routing(),
            });
        }

        let min_delivery = delivery_orders.keys().next().copied().unwrap_or(0);
        let mut item = Item::new(
            ItemId(self.items.len()),
            merged_id,
            template.product.clone(),
            amount,
            min_delivery,
        )
        .with_delivery_orders(delivery_orders)?
        .with_detached(detached)?;
        item.customer_amounts = customer_amounts;
        item.additional_occupation = additional;
        item.safe_side = match safe_sides.split_first() {
            Some((head, rest)) if rest.iter().all(|s| s == head) => *head,
            _ => SafeSide::Indifferent,
        };
        item.sources = sources;
        Ok(item)
    }

    // ==========================================
    // 回挂
    // ==========================================

    /// 按来源把已装载商品回挂到原订单商品
    ///
    /// 匹配顺序: 路线元数据 -> 单一来源 -> 剩余数量相等 -> 第一个装得下的来源 -> 按来源拆分
    pub fn reattach_original_orders_to_mounted_products(&mut self) -> PalletizeResult<ReattachReport> {
        let mut report = ReattachReport::default();
        if !self.is_merged() {
            return Ok(report);
        }

        let mut left: HashMap<ItemId, u32> = HashMap::new();
        for item in self.all_items() {
            for source in &item.sources {
                left.insert(source.item_id, source.amount);
            }
        }

        let ordered: Vec<(MountedSpaceId, MountedProductId)> = {
            let mut list = Vec::new();
            for ms in self.all_mounted_spaces() {
                for mp in self.products_of(ms.id)? {
                    list.push((ms.id, mp.id));
                }
            }
            list
        };

        for (ms_id, mp_id) in ordered {
            let mp = self.mounted_product(mp_id)?.clone();
            let sources = self.item(mp.item)?.sources.clone();
            if sources.is_empty() {
                continue;
            }
            let remaining_of = |s: &ItemSource, left: &HashMap<ItemId, u32>| {
                left.get(&s.item_id).copied().unwrap_or(0)
            };

            let matched = if let Some(s) = mp.routing.as_ref().and_then(|r| {
                sources
                    .iter()
                    .find(|s| &s.routing == r && remaining_of(s, &left) >= mp.amount)
            }) {
                report.by_routing += 1;
                Some(s.clone())
            } else if sources.len() == 1 {
                report.single_source += 1;
                Some(sources[0].clone())
            } else if let Some(s) = sources.iter().find(|s| remaining_of(s, &left) == mp.amount) {
                report.exact_quantity += 1;
                Some(s.clone())
            } else if let Some(s) = sources.iter().find(|s| remaining_of(s, &left) >= mp.amount) {
                report.first_fit += 1;
                Some(s.clone())
            } else {
                None
            };

            match matched {
                Some(source) => {
                    let entry = left.entry(source.item_id).or_insert(0);
                    *entry = entry.saturating_sub(mp.amount);
                    let target = self.mounted_product_mut(mp_id)?;
                    target.item = source.item_id;
                    target.routing = Some(source.routing);
                }
                None => {
                    let resolved = self.split_across_sources(ms_id, &mp, &sources, &mut left)?;
                    if resolved {
                        report.splitted += 1;
                    } else {
                        report.unresolved += 1;
                    }
                }
            }
        }
        debug!(?report, "回挂原订单");
        Ok(report)
    }

    /// 把一个已装载商品按来源剩余数量拆成多个, 占用按比例分摊, 余数落在最后一块
    fn split_across_sources(
        &mut self,
        ms_id: MountedSpaceId,
        mp: &MountedProduct,
        sources: &[ItemSource],
        left: &mut HashMap<ItemId, u32>,
    ) -> PalletizeResult<bool> {
        let mut chunks: Vec<(ItemSource, u32)> = Vec::new();
        let mut to_assign = mp.amount;
        for source in sources {
            if to_assign == 0 {
                break;
            }
            let avail = left.get(&source.item_id).copied().unwrap_or(0);
            if avail == 0 {
                continue;
            }
            let take = avail.min(to_assign);
            chunks.push((source.clone(), take));
            to_assign -= take;
        }
        let fully_resolved = to_assign == 0;
        if chunks.is_empty() {
            warn!(mounted_product = mp.id.0, product_code = mp.product_code, "无法回挂已装载商品");
            return Ok(false);
        }
        if to_assign > 0 {
            if let Some(last) = chunks.last_mut() {
                last.1 += to_assign;
            }
        }

        let mut occupation_left = mp.occupation;
        let count = chunks.len();
        for (index, (source, amount)) in chunks.into_iter().enumerate() {
            let occupation = if index + 1 == count {
                occupation_left
            } else {
                mp.occupation * Decimal::from(amount) / Decimal::from(mp.amount)
            };
            occupation_left -= occupation;
            let entry = left.entry(source.item_id).or_insert(0);
            *entry = entry.saturating_sub(amount);

            if index == 0 {
                let target = self.mounted_product_mut(mp.id)?;
                target.item = source.item_id;
                target.amount = amount;
                target.occupation = occupation;
                target.splitted = true;
                target.routing = Some(source.routing);
            } else {
                let id = MountedProductId(self.state.allocate_id());
                self.state.products.insert(
                    id,
                    MountedProduct {
                        id,
                        item: source.item_id,
                        amount,
                        occupation,
                        splitted: true,
                        routing: Some(source.routing),
                        ..mp.clone()
                    },
                );
                self.state
                    .containers
                    .get_mut(&mp.container)
                    .ok_or(PalletizeError::ContainerNotFound(mp.container))?
                    .products
                    .push(id);
            }
        }
        self.refresh_occupation(ms_id)?;
        Ok(fully_resolved)
    }

    // ==========================================
    // 拆分
    // ==========================================

    /// 回挂并恢复原订单
    ///
    /// # 返回
    /// - `Ok(None)`: 未合并
    pub fn unmerge_orders_in_place(&mut self) -> PalletizeResult<Option<ReattachReport>> {
        if !self.is_merged() {
            return Ok(None);
        }
        let report = self.reattach_original_orders_to_mounted_products()?;
        let Some(stash) = self.merge_stash.take() else {
            return Ok(Some(report));
        };

        // 合并商品上的不可装载原因传递给来源
        let mut reasons: HashMap<ItemId, String> = HashMap::new();
        for item in self.all_items() {
            if let Some(reason) = item.non_palletizable_reason() {
                for source in &item.sources {
                    reasons.insert(source.item_id, reason.to_string());
                }
            }
        }

        let source_ids: Vec<ItemId> = stash
            .original_orders
            .iter()
            .flat_map(|o| o.items.iter().copied())
            .collect();
        for id in source_ids {
            let (placed, placed_detached) = self.mounted_products_of_item(id).iter().fold(
                (0u32, 0u32),
                |(all, det), mp| (all + mp.amount, if mp.detached { det + mp.amount } else { det }),
            );
            let item = self.item_mut(id)?;
            let remaining = item.amount.saturating_sub(placed);
            let detached = item.detached_amount.saturating_sub(placed_detached);
            item.restore_remaining(remaining, detached);
            if remaining > 0 {
                if let Some(reason) = reasons.remove(&id) {
                    item.mark_non_palletizable(reason);
                }
            }
        }

        let merged_order = stash.merged_order;
        self.orders = stash.original_orders;
        for ms in self.state.mounted_spaces.values_mut() {
            if ms.order == Some(merged_order) {
                ms.order = None;
            }
        }

        for item in self.all_items() {
            let placed = self.placed_amount_of(item.id);
            if item.amount != item.amount_remaining() + placed {
                return Err(PalletizeError::InvariantViolation(format!(
                    "拆分后数量不守恒: product_code={}, amount={}, remaining={}, placed={}",
                    item.code,
                    item.amount,
                    item.amount_remaining(),
                    placed
                )));
            }
        }
        info!(orders = self.orders.len(), reattached = report.total(), "拆分订单");
        Ok(Some(report))
    }
}
