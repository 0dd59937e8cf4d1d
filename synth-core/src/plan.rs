//! Randomized amounts for a run.
//!
//! Every amount and buffer is sampled up front from an explicit RNG and handed to the scenario
//! that uses it, so a run seeded with the same value produces the same payments.

use crate::Error;
use bitcoin::Amount;
use rand::Rng;

/// A base amount plus up to `spread` sats of additive noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountBand {
    base: Amount,
    spread: Amount,
}

impl AmountBand {
    pub fn new(base: Amount, spread: Amount) -> Self {
        Self { base, spread }
    }

    /// A band covering `[min, max]`.
    pub fn between(min: Amount, max: Amount) -> Result<Self, Error> {
        let spread = max
            .checked_sub(min)
            .ok_or_else(|| Error::config(format!(
                "empty amount range: {} > {} sats",
                min.to_sat(),
                max.to_sat()
            )))?;

        Ok(Self { base: min, spread })
    }

    /// A band that always yields `amount`.
    pub fn fixed(amount: Amount) -> Self {
        Self::new(amount, Amount::ZERO)
    }

    pub fn min(&self) -> Amount {
        self.base
    }

    pub fn max(&self) -> Amount {
        self.base + self.spread
    }

    pub fn sample<R>(&self, rng: &mut R) -> Amount
    where
        R: Rng + ?Sized,
    {
        let noise = rng.gen_range(0..=self.spread.to_sat());
        self.base + Amount::from_sat(noise)
    }
}

/// Amounts for one bidirectional swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapPlan {
    /// What B pays into A.
    pub amount: Amount,
    /// Kept back from A's balance before paying B, to absorb routing fees.
    pub buffer: Amount,
}

impl SwapPlan {
    pub fn new(amount: Amount, buffer: Amount) -> Self {
        Self { amount, buffer }
    }

    pub fn sample<R>(rng: &mut R, amount: &AmountBand, buffer: &AmountBand) -> Self
    where
        R: Rng + ?Sized,
    {
        Self {
            amount: amount.sample(rng),
            buffer: buffer.sample(rng),
        }
    }

    /// How much can be sent back out of `balance`.
    ///
    /// `None` means the balance does not cover the buffer, and the return leg must not be
    /// attempted.
    pub fn return_amount(&self, balance: Amount) -> Option<Amount> {
        balance
            .checked_sub(self.buffer)
            .filter(|amount| *amount > Amount::ZERO)
    }
}
