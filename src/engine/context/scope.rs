// ==========================================
// 装载上下文 - 范围过滤
// ==========================================
// 职责: 临时收窄 orders/spaces/mounted_spaces 视图, 不修改底层集合
// 红线: 过滤必须在所有退出路径上清除（ScopeGuard 在 Drop 时弹出）
// ==========================================

use crate::domain::mounted::{MountedSpace, MountedSpaceId};
use crate::domain::order::{Order, OrderId};
use crate::domain::space::{Space, SpaceKey};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use super::core::PalletizeContext;

pub type OrderPredicate = Arc<dyn Fn(&Order) -> bool + Send + Sync>;
pub type MountedSpacePredicate = Arc<dyn Fn(&MountedSpace) -> bool + Send + Sync>;

/// 范围过滤器（栈式叠加, 多个过滤器取交集）
#[derive(Clone)]
pub enum ScopeFilter {
    OnlyOrder(OrderId),
    OnlySpace(SpaceKey),
    OnlyMountedSpace(MountedSpaceId),
    OrderPredicate(OrderPredicate),
    MountedSpacePredicate(MountedSpacePredicate),
}

impl fmt::Debug for ScopeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeFilter::OnlyOrder(id) => write!(f, "OnlyOrder({:?})", id),
            ScopeFilter::OnlySpace(key) => write!(f, "OnlySpace({})", key),
            ScopeFilter::OnlyMountedSpace(id) => write!(f, "OnlyMountedSpace({:?})", id),
            ScopeFilter::OrderPredicate(_) => write!(f, "OrderPredicate(..)"),
            ScopeFilter::MountedSpacePredicate(_) => write!(f, "MountedSpacePredicate(..)"),
        }
    }
}

impl ScopeFilter {
    pub(crate) fn admits_order(&self, order: &Order) -> bool {
        match self {
            ScopeFilter::OnlyOrder(id) => order.id == *id,
            ScopeFilter::OrderPredicate(pred) => pred(order),
            _ => true,
        }
    }

    pub(crate) fn admits_space(&self, space: &Space) -> bool {
        match self {
            ScopeFilter::OnlySpace(key) => space.key() == *key,
            _ => true,
        }
    }

    /// 订单过滤下只可见该订单专属的托盘
    pub(crate) fn admits_mounted_space(&self, ms: &MountedSpace) -> bool {
        match self {
            ScopeFilter::OnlyOrder(id) => ms.order == Some(*id),
            ScopeFilter::OnlySpace(key) => ms.key() == *key,
            ScopeFilter::OnlyMountedSpace(id) => ms.id == *id,
            ScopeFilter::MountedSpacePredicate(pred) => pred(ms),
            ScopeFilter::OrderPredicate(_) => true,
        }
    }
}

// ==========================================
// ScopeGuard - 作用域过滤守卫
// ==========================================
// 解引用为上下文; Drop 时恢复进入前的过滤深度
pub struct ScopeGuard<'a> {
    context: &'a mut PalletizeContext,
    depth: usize,
}

impl Deref for ScopeGuard<'_> {
    type Target = PalletizeContext;

    fn deref(&self) -> &Self::Target {
        self.context
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.context
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.context.filters.truncate(self.depth);
    }
}

impl PalletizeContext {
    /// 进入过滤作用域
    pub fn scoped(&mut self, filter: ScopeFilter) -> ScopeGuard<'_> {
        let depth = self.filters.len();
        self.filters.push(filter);
        ScopeGuard {
            context: self,
            depth,
        }
    }

    /// 在过滤作用域内执行闭包, 返回后过滤自动清除
    pub fn with_scope<R>(&mut self, filter: ScopeFilter, f: impl FnOnce(&mut PalletizeContext) -> R) -> R {
        let mut guard = self.scoped(filter);
        f(&mut *guard)
    }

    pub fn with_only_order(&mut self, id: OrderId) -> ScopeGuard<'_> {
        self.scoped(ScopeFilter::OnlyOrder(id))
    }

    pub fn with_only_space(&mut self, key: SpaceKey) -> ScopeGuard<'_> {
        self.scoped(ScopeFilter::OnlySpace(key))
    }

    pub fn with_only_mounted_space(&mut self, id: MountedSpaceId) -> ScopeGuard<'_> {
        self.scoped(ScopeFilter::OnlyMountedSpace(id))
    }

    pub fn with_order_filter(
        &mut self,
        pred: impl Fn(&Order) -> bool + Send + Sync + 'static,
    ) -> ScopeGuard<'_> {
        self.scoped(ScopeFilter::OrderPredicate(Arc::new(pred)))
    }

    pub fn with_mounted_space_filter(
        &mut self,
        pred: impl Fn(&MountedSpace) -> bool + Send + Sync + 'static,
    ) -> ScopeGuard<'_> {
        self.scoped(ScopeFilter::MountedSpacePredicate(Arc::new(pred)))
    }

    /// 当前过滤深度（规则链用于检测泄漏）
    pub fn filter_depth(&self) -> usize {
        self.filters.len()
    }

    pub fn active_filters(&self) -> &[ScopeFilter] {
        &self.filters
    }

    /// 截断过滤栈到指定深度
    pub(crate) fn truncate_filters(&mut self, depth: usize) {
        self.filters.truncate(depth);
    }

    /// 当前作用域的专属订单（决定新建托盘的归属）
    pub fn scoped_order_owner(&self) -> Option<OrderId> {
        self.filters.iter().rev().find_map(|f| match f {
            ScopeFilter::OnlyOrder(id) => Some(*id),
            _ => None,
        })
    }

    pub(crate) fn order_in_scope(&self, order: &Order) -> bool {
        self.filters.iter().all(|f| f.admits_order(order))
    }

    pub(crate) fn space_in_scope(&self, space: &Space) -> bool {
        self.filters.iter().all(|f| f.admits_space(space))
    }

    pub(crate) fn mounted_space_in_scope(&self, ms: &MountedSpace) -> bool {
        self.filters.iter().all(|f| f.admits_mounted_space(ms))
    }
}
