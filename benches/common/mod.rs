#![allow(dead_code)]

use clmm_pool_manager::math::{
    math_helpers, sqrt_price_math, swap_math, tick_bitmap, tick_math,
};
use clmm_pool_manager::{
    Address, Currency, ManagerConfig, ModifyLiquidityParams, PoolKey, PoolManager, Q96,
    SQRT_PRICE_1_1, SwapParams, U256,
};
use criterion::{BatchSize, Criterion};
use std::hint::black_box;

const TICKS: [i32; 6] = [-887_272, -200_000, -1, 0, 46_054, 887_272];

pub fn bench_tick_math(c: &mut Criterion) {
    c.bench_function("get_sqrt_price_at_tick", |b| {
        b.iter(|| {
            for tick in TICKS {
                black_box(tick_math::get_sqrt_price_at_tick(black_box(tick)).unwrap());
            }
        })
    });

    let prices: Vec<U256> = [-887_272, -200_000, 0, 46_054, 887_271]
        .into_iter()
        .map(|tick| tick_math::get_sqrt_price_at_tick(tick).unwrap())
        .collect();
    c.bench_function("get_tick_at_sqrt_price", |b| {
        b.iter(|| {
            for price in &prices {
                black_box(tick_math::get_tick_at_sqrt_price(black_box(*price)).unwrap());
            }
        })
    });
}

pub fn bench_sqrt_price_math(c: &mut Criterion) {
    let liquidity = 10u128.pow(18);
    let amount = U256::from(10u128.pow(15));

    c.bench_function("get_next_sqrt_price_from_input", |b| {
        b.iter(|| {
            black_box(
                sqrt_price_math::get_next_sqrt_price_from_input(
                    black_box(SQRT_PRICE_1_1),
                    black_box(liquidity),
                    black_box(amount),
                    true,
                )
                .unwrap(),
            )
        })
    });

    c.bench_function("get_next_sqrt_price_from_output", |b| {
        b.iter(|| {
            black_box(
                sqrt_price_math::get_next_sqrt_price_from_output(
                    black_box(SQRT_PRICE_1_1),
                    black_box(liquidity),
                    black_box(amount),
                    false,
                )
                .unwrap(),
            )
        })
    });

    let lower = tick_math::get_sqrt_price_at_tick(-120).unwrap();
    let upper = tick_math::get_sqrt_price_at_tick(120).unwrap();
    c.bench_function("get_amount_deltas", |b| {
        b.iter(|| {
            black_box(
                sqrt_price_math::get_amount_0_delta_base(lower, upper, liquidity, true).unwrap(),
            );
            black_box(
                sqrt_price_math::get_amount_1_delta_base(lower, upper, liquidity, true).unwrap(),
            );
        })
    });

    c.bench_function("amounts_for_price_move", |b| {
        b.iter(|| {
            black_box(
                sqrt_price_math::amounts_for_price_move(
                    black_box(upper),
                    black_box(lower),
                    liquidity,
                    sqrt_price_math::Rounding::Down,
                )
                .unwrap(),
            )
        })
    });
}

pub fn bench_swap_math(c: &mut Criterion) {
    let target = tick_math::get_sqrt_price_at_tick(-600).unwrap();
    c.bench_function("compute_swap_step", |b| {
        b.iter(|| {
            black_box(
                swap_math::compute_swap_step(
                    black_box(SQRT_PRICE_1_1),
                    black_box(target),
                    black_box(10u128.pow(18)),
                    black_box(10i128.pow(15)),
                    3000,
                )
                .unwrap(),
            )
        })
    });
}

pub fn bench_math_helpers(c: &mut Criterion) {
    let a = U256::MAX / U256::from(3);
    let b = Q96 * U256::from(7);
    let denominator = U256::MAX / U256::from(5);
    c.bench_function("mul_div", |bench| {
        bench.iter(|| black_box(math_helpers::mul_div(black_box(a), black_box(b), black_box(denominator))))
    });
    c.bench_function("mul_div_rounding_up", |bench| {
        bench.iter(|| {
            black_box(math_helpers::mul_div_rounding_up(
                black_box(a),
                black_box(b),
                black_box(denominator),
            ))
        })
    });
}

pub fn bench_tick_bitmap(c: &mut Criterion) {
    let mut bitmap = tick_bitmap::TickBitmap::default();
    for tick in (-30_000..30_000).step_by(600) {
        tick_bitmap::flip_tick(&mut bitmap, tick, 60).unwrap();
    }
    c.bench_function("next_initialized_tick_within_one_word", |b| {
        b.iter(|| {
            black_box(tick_bitmap::next_initialized_tick_within_one_word(
                &bitmap,
                black_box(1_234),
                60,
                true,
            ));
            black_box(tick_bitmap::next_initialized_tick_within_one_word(
                &bitmap,
                black_box(-1_234),
                60,
                false,
            ));
        })
    });
    c.bench_function("has_initialized_tick", |b| {
        b.iter(|| black_box(tick_bitmap::has_initialized_tick(&bitmap, black_box(-40_000), 60, false)))
    });
}

pub fn pool_key() -> PoolKey {
    PoolKey::new(
        Currency::from(Address::with_last_byte(1)),
        Currency::from(Address::with_last_byte(2)),
        3000,
        60,
        Address::ZERO,
    )
}

/// A manager holding one pool with a ladder of overlapping positions.
pub fn seeded_manager() -> PoolManager {
    let owner = Address::with_last_byte(0xaa);
    let mut manager = PoolManager::new(ManagerConfig::new(owner)).unwrap();
    let key = pool_key();
    manager.initialize(owner, &key, SQRT_PRICE_1_1).unwrap();
    manager
        .unlock(owner, |m| {
            for width in 1..=20 {
                let params = ModifyLiquidityParams::new(-60 * width, 60 * width, 10i128.pow(18));
                m.modify_liquidity(&key, params)?;
            }
            settle_all(m, &key)
        })
        .unwrap();
    manager
}

pub fn settle_all(
    manager: &mut PoolManager,
    key: &PoolKey,
) -> Result<(), clmm_pool_manager::Error> {
    for currency in [key.currency0, key.currency1] {
        let delta = manager.currency_delta(currency);
        if delta < 0 {
            manager.settle(currency, delta.unsigned_abs())?;
        } else if delta > 0 {
            manager.take(currency, delta.unsigned_abs())?;
        }
    }
    Ok(())
}

pub fn bench_swap(c: &mut Criterion) {
    let key = pool_key();
    let trader = Address::with_last_byte(0xbb);
    let limit = tick_math::MIN_SQRT_PRICE + U256::from(1);

    for (name, amount) in [("swap_within_range", 10i128.pow(15)), ("swap_crossing_ticks", 10i128.pow(19))] {
        c.bench_function(name, |b| {
            b.iter_batched(
                seeded_manager,
                |mut manager| {
                    manager
                        .unlock(trader, |m| {
                            let delta = m.swap(&key, SwapParams::new(true, amount, limit))?;
                            settle_all(m, &key)?;
                            Ok(black_box(delta))
                        })
                        .unwrap()
                },
                BatchSize::SmallInput,
            )
        });
    }
}
