use crate::domain::{AdminProductView, Order, ProductView};

/// Everything a region can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    Product(ProductView),
    Products(Vec<ProductView>),
    AdminProduct(AdminProductView),
    AdminProducts(Vec<AdminProductView>),
    Order(Order),
    Orders(Vec<Order>),
}

/// A response type that can be stored in the cache.
pub trait Cacheable: Clone + Sized {
    fn into_value(self) -> CacheValue;
    fn from_value(value: CacheValue) -> Option<Self>;
}

macro_rules! cacheable {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Cacheable for $ty {
                fn into_value(self) -> CacheValue {
                    CacheValue::$variant(self)
                }

                fn from_value(value: CacheValue) -> Option<Self> {
                    match value {
                        CacheValue::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            }
        )*
    };
}

cacheable! {
    ProductView => Product,
    Vec<ProductView> => Products,
    AdminProductView => AdminProduct,
    Vec<AdminProductView> => AdminProducts,
    Order => Order,
    Vec<Order> => Orders,
}
