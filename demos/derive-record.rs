//! Example deriving record support for a plain struct.
//!
//! Run with `cargo run --example derive-record --features derive`.

use shrike::*;

#[derive(Record, Debug, Clone, PartialEq)]
struct Order {
    #[shrike(generator = gen::unsigned(Range::new(1u32, 50).unwrap()))]
    quantity: u32,
    #[shrike(generator = gen::unsigned(Range::new(1u64, 10_000).unwrap()))]
    unit_price: u64,
    coupon: Option<u8>,
}

impl Order {
    fn total(&self) -> u64 {
        let gross = self.quantity as u64 * self.unit_price;
        gross.saturating_sub(self.coupon.unwrap_or(0) as u64 * 100)
    }
}

fn main() -> Result<()> {
    println!("Order type: {}", Order::type_of());

    let config = Config::default().with_seed(7);
    let result = Property::define(vec![Order::generator()], |order: Order| {
        if order.total() <= 400_000 {
            Ok(())
        } else {
            Err(format!("total {} exceeds the credit limit", order.total()))
        }
    })?
    .named("orders stay within the credit limit")
    .check(&config)?;

    println!("{result}");
    Ok(())
}
