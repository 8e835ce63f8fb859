use agora_core::{Money, Price};
use serde::Serialize;

/// Exponentially weighted moving average. `alpha` is the weight of the
/// newest observation.
#[derive(Debug, Clone, Serialize)]
pub struct ExponentialFilter {
    alpha: f64,
    value: Option<f64>,
}

impl ExponentialFilter {
    pub fn new(alpha: f64) -> Self {
        ExponentialFilter { alpha, value: None }
    }

    pub fn add(&mut self, observation: f64) {
        self.value = Some(match self.value {
            None => observation,
            Some(current) => self.alpha * observation + (1.0 - self.alpha) * current,
        });
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

/// One row of the per-day history: the closing price (last trade of the
/// day, if any) and the day's volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyObservation {
    pub day: u32,
    pub closing_price: Option<Price>,
    pub volume: u32,
}

/// Per-market trading statistics.
///
/// `record_trade` is called once per settled trade. Day counters roll over
/// in `collect_day_statistics`, week counters in `week_end`; each rollover
/// resets its period exactly once.
#[derive(Debug, Clone, Serialize)]
pub struct MarketRecords {
    last_price: Option<Price>,
    yesterday_last_price: Option<Price>,
    last_filled_bid: Option<Price>,
    last_filled_ask: Option<Price>,
    /// Trade price minus the good's prior valuation. Negative when the
    /// seller let the unit go below what it last traded at.
    last_markup: Option<Money>,
    today_volume: u32,
    yesterday_volume: u32,
    weekly_volume: u32,
    last_week_volume: u32,
    today_sum_closing: u64,
    yesterday_sum_closing: u64,
    smoothed_price: ExponentialFilter,
    history: Vec<DailyObservation>,
    record_history: bool,
}

impl MarketRecords {
    const SMOOTHING_ALPHA: f64 = 0.1;

    pub fn new(record_history: bool) -> Self {
        MarketRecords {
            last_price: None,
            yesterday_last_price: None,
            last_filled_bid: None,
            last_filled_ask: None,
            last_markup: None,
            today_volume: 0,
            yesterday_volume: 0,
            weekly_volume: 0,
            last_week_volume: 0,
            today_sum_closing: 0,
            yesterday_sum_closing: 0,
            smoothed_price: ExponentialFilter::new(Self::SMOOTHING_ALPHA),
            history: Vec::new(),
            record_history,
        }
    }

    pub fn record_trade(&mut self, price: Price, bid: Price, ask: Price, prior_valuation: Price) {
        self.last_price = Some(price);
        self.last_filled_bid = Some(bid);
        self.last_filled_ask = Some(ask);
        self.last_markup = Some(price.as_money() - prior_valuation.as_money());
        self.today_volume += 1;
        self.weekly_volume += 1;
        self.today_sum_closing += price.inner();
        self.smoothed_price.add(price.inner() as f64);
    }

    /// Day rollover: shift today's counters into yesterday's and reset.
    pub fn collect_day_statistics(&mut self, day: u32) {
        if self.record_history {
            self.history.push(DailyObservation {
                day,
                closing_price: self.last_price,
                volume: self.today_volume,
            });
        }
        self.yesterday_volume = self.today_volume;
        self.yesterday_last_price = self.last_price;
        self.yesterday_sum_closing = self.today_sum_closing;
        self.today_volume = 0;
        self.today_sum_closing = 0;
    }

    /// Week rollover: shift the weekly counter and reset.
    pub fn week_end(&mut self) {
        self.last_week_volume = self.weekly_volume;
        self.weekly_volume = 0;
    }

    pub fn last_price(&self) -> Option<Price> {
        self.last_price
    }

    pub fn yesterday_last_price(&self) -> Option<Price> {
        self.yesterday_last_price
    }

    pub fn last_filled_bid(&self) -> Option<Price> {
        self.last_filled_bid
    }

    pub fn last_filled_ask(&self) -> Option<Price> {
        self.last_filled_ask
    }

    pub fn last_markup(&self) -> Option<Money> {
        self.last_markup
    }

    pub fn today_volume(&self) -> u32 {
        self.today_volume
    }

    pub fn yesterday_volume(&self) -> u32 {
        self.yesterday_volume
    }

    pub fn weekly_volume(&self) -> u32 {
        self.weekly_volume
    }

    pub fn last_week_volume(&self) -> u32 {
        self.last_week_volume
    }

    /// Mean trade price so far today, if anything traded.
    pub fn today_average_price(&self) -> Option<f64> {
        if self.today_volume == 0 {
            None
        } else {
            Some(self.today_sum_closing as f64 / self.today_volume as f64)
        }
    }

    /// Exponentially smoothed trade price across the whole run.
    pub fn smoothed_price(&self) -> Option<f64> {
        self.smoothed_price.value()
    }

    pub fn history(&self) -> &[DailyObservation] {
        &self.history
    }
}
