// ==========================================
// 车辆托盘装载引擎 - 占用换算
// ==========================================
// 职责: 数量 <-> 车位容量占用的纯函数换算
// 公式: occupation = quantity × (factor + 附加占用)
// 红线: 缺少装载系数是目录错误, 必须上抛, 不可静默
// ==========================================

use crate::domain::item::Item;
use crate::domain::product::Product;
use crate::engine::error::{PalletizeError, PalletizeResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// 换算依据: 车位尺寸（查表）或已解析的系数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeOrFactor {
    Size(Decimal),
    Factor(Decimal),
}

// ==========================================
// FactorConverter - 占用换算器
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct FactorConverter {
    // 无状态换算器
}

impl FactorConverter {
    pub fn new() -> Self {
        Self {}
    }

    /// 查找商品在指定尺寸车位上的装载系数
    ///
    /// # 返回
    /// - `Err(MissingFactor)`: 目录中无此尺寸或系数非正
    pub fn factor_for(&self, product: &Product, space_size: Decimal) -> PalletizeResult<Decimal> {
        match product.factor_for_size(space_size) {
            Some(f) if f > Decimal::ZERO => Ok(f),
            _ => Err(PalletizeError::MissingFactor {
                product_code: product.code,
                space_size,
            }),
        }
    }

    /// 单位占用（含可选附加占用）
    pub fn unit_occupation(
        &self,
        size_or_factor: SizeOrFactor,
        item: &Item,
        apply_height_adjustment: bool,
    ) -> PalletizeResult<Decimal> {
        let factor = match size_or_factor {
            SizeOrFactor::Size(size) => self.factor_for(&item.product, size)?,
            SizeOrFactor::Factor(f) if f > Decimal::ZERO => f,
            SizeOrFactor::Factor(f) => {
                return Err(PalletizeError::InvalidInput(format!(
                    "装载系数必须为正: product_code={}, factor={}",
                    item.code, f
                )))
            }
        };
        Ok(factor + self.adjustment(item, apply_height_adjustment))
    }

    /// 计算 quantity 个单位的占用
    pub fn occupation(
        &self,
        quantity: u32,
        size_or_factor: SizeOrFactor,
        item: &Item,
        apply_height_adjustment: bool,
    ) -> PalletizeResult<Decimal> {
        let unit = self.unit_occupation(size_or_factor, item, apply_height_adjustment)?;
        Ok(unit * Decimal::from(quantity))
    }

    /// 给定可用容量与系数, 最多可放入的数量（向下取整）
    pub fn quantity_per_factor(
        &self,
        available: Decimal,
        factor: Decimal,
        item: &Item,
        apply_height_adjustment: bool,
    ) -> u32 {
        let unit = factor + self.adjustment(item, apply_height_adjustment);
        if available <= Decimal::ZERO || unit <= Decimal::ZERO {
            return 0;
        }
        (available / unit).floor().to_u32().unwrap_or(u32::MAX)
    }

    /// 某车位剩余容量最多可放入的数量
    ///
    /// # 参数
    /// - `size`: 车位尺寸（决定系数）
    /// - `occupation`: 车位现有占用
    pub fn quantity_to_remaining_space(
        &self,
        size: Decimal,
        occupation: Decimal,
        item: &Item,
        apply_height_adjustment: bool,
    ) -> PalletizeResult<u32> {
        let factor = self.factor_for(&item.product, size)?;
        Ok(self.quantity_per_factor(size - occupation, factor, item, apply_height_adjustment))
    }

    fn adjustment(&self, item: &Item, apply_height_adjustment: bool) -> Decimal {
        if apply_height_adjustment {
            item.additional_occupation.max(Decimal::ZERO)
        } else {
            Decimal::ZERO
        }
    }
}

impl Default for FactorConverter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::ItemId;
    use crate::domain::order::OrderId;
    use crate::domain::product::PackingGroup;
    use std::sync::Arc;

    fn test_item(factor: Decimal) -> Item {
        let product = Product::new(1, "P", PackingGroup::new(1, 1)).with_factor(Decimal::from(10), factor);
        Item::new(ItemId(0), OrderId(1), Arc::new(product), 15, 1)
    }

    #[test]
    fn test_occupation_by_size() {
        let converter = FactorConverter::new();
        let item = test_item(Decimal::ONE);
        let occ = converter
            .occupation(10, SizeOrFactor::Size(Decimal::from(10)), &item, false)
            .unwrap();
        assert_eq!(occ, Decimal::from(10));
    }

    #[test]
    fn test_missing_factor_is_catalog_error() {
        let converter = FactorConverter::new();
        let item = test_item(Decimal::ONE);
        let err = converter
            .occupation(1, SizeOrFactor::Size(Decimal::from(8)), &item, false)
            .unwrap_err();
        assert!(matches!(err, PalletizeError::MissingFactor { product_code: 1, .. }));
        assert!(err.is_structural());
    }

    #[test]
    fn test_height_adjustment_added_per_unit() {
        let converter = FactorConverter::new();
        let mut item = test_item(Decimal::ONE);
        item.additional_occupation = Decimal::new(5, 1);
        let occ = converter
            .occupation(4, SizeOrFactor::Factor(Decimal::ONE), &item, true)
            .unwrap();
        assert_eq!(occ, Decimal::from(6));
        let occ = converter
            .occupation(4, SizeOrFactor::Factor(Decimal::ONE), &item, false)
            .unwrap();
        assert_eq!(occ, Decimal::from(4));
    }

    #[test]
    fn test_quantity_to_remaining_space_floors() {
        let converter = FactorConverter::new();
        let item = test_item(Decimal::new(3, 0));
        // 剩余 10 - 2 = 8, 每单位 3 => 2
        let qty = converter
            .quantity_to_remaining_space(Decimal::from(10), Decimal::from(2), &item, false)
            .unwrap();
        assert_eq!(qty, 2);
        assert_eq!(converter.quantity_per_factor(Decimal::ZERO, Decimal::ONE, &item, false), 0);
    }
}
