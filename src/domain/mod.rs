// ==========================================
// 车辆托盘装载引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型与派生查询
// 红线: 不含上下文逻辑, 不含规则逻辑
// ==========================================

pub mod error;
pub mod input;
pub mod item;
pub mod mounted;
pub mod order;
pub mod product;
pub mod space;
pub mod types;

// 重导出核心类型
pub use error::{DomainError, DomainResult};
pub use input::PalletizeInput;
pub use item::{Item, ItemId, ItemSource};
pub use mounted::{
    Container, ContainerId, MountedProduct, MountedProductId, MountedSpace, MountedSpaceId,
};
pub use order::{Order, OrderId, RoutingInfo};
pub use product::{LayerSettings, PackingFactor, PackingGroup, Product, ProductCatalog};
pub use space::{Space, SpaceKey};
pub use types::{ContainerType, MapKind, SafeSide, SpaceSide};
