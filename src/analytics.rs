use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use crate::records::Transaction;

pub const DEFAULT_TOP_N: usize = 5;
pub const DEFAULT_LOW_THRESHOLD: i64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct RegionStats {
    pub region: String,
    pub total_sales: f64,
    pub transaction_count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductStats {
    pub product: String,
    pub total_quantity: i64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerStats {
    pub customer_id: String,
    pub total_spent: f64,
    pub purchase_count: usize,
    pub avg_order_value: f64,
    /// Distinct product names, sorted.
    pub products_bought: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyStats {
    pub date: String,
    pub revenue: f64,
    pub transaction_count: usize,
    pub unique_customers: usize,
}

/// Highest-revenue day. `date` is `None` when there is no data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakDay {
    pub date: Option<String>,
    pub revenue: f64,
    pub transaction_count: usize,
}

/// Groups transactions by `key` and folds each group into an accumulator.
/// Groups come back in the order their key was first seen.
pub fn group_fold<'a, K, A, F, G>(transactions: &'a [Transaction], key: F, mut fold: G) -> Vec<(K, A)>
where
    K: Eq + Hash + Clone,
    A: Default,
    F: Fn(&'a Transaction) -> K,
    G: FnMut(&mut A, &'a Transaction),
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, A)> = Vec::new();

    for t in transactions {
        let k = key(t);
        let slot = *index.entry(k.clone()).or_insert_with(|| {
            groups.push((k, A::default()));
            groups.len() - 1
        });
        fold(&mut groups[slot].1, t);
    }

    groups
}

pub fn calculate_total_revenue(transactions: &[Transaction]) -> f64 {
    transactions.iter().map(Transaction::amount).sum()
}

pub fn region_wise_sales(transactions: &[Transaction]) -> Vec<RegionStats> {
    let total_revenue = calculate_total_revenue(transactions);

    let mut stats: Vec<RegionStats> = group_fold(
        transactions,
        |t| t.region.as_str(),
        |acc: &mut (f64, usize), t| {
            acc.0 += t.amount();
            acc.1 += 1;
        },
    )
    .into_iter()
    .map(|(region, (total_sales, transaction_count))| RegionStats {
        region: region.to_owned(),
        total_sales,
        transaction_count,
        percentage: if total_revenue > 0.0 {
            total_sales / total_revenue * 100.0
        } else {
            0.0
        },
    })
    .collect();

    stats.sort_by(|a, b| b.total_sales.total_cmp(&a.total_sales));
    stats
}

fn product_stats(transactions: &[Transaction]) -> Vec<ProductStats> {
    group_fold(
        transactions,
        |t| t.product_name.as_str(),
        |acc: &mut (i64, f64), t| {
            acc.0 = acc.0.saturating_add(t.quantity);
            acc.1 += t.amount();
        },
    )
    .into_iter()
    .map(|(product, (total_quantity, total_revenue))| ProductStats {
        product: product.to_owned(),
        total_quantity,
        total_revenue,
    })
    .collect()
}

/// Top `n` products by quantity sold; ties keep first-seen order.
pub fn top_selling_products(transactions: &[Transaction], n: usize) -> Vec<ProductStats> {
    let mut products = product_stats(transactions);
    products.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));
    products.truncate(n);
    products
}

pub fn low_performing_products(transactions: &[Transaction], threshold: i64) -> Vec<ProductStats> {
    let mut products: Vec<ProductStats> = product_stats(transactions)
        .into_iter()
        .filter(|p| p.total_quantity < threshold)
        .collect();
    products.sort_by_key(|p| p.total_quantity);
    products
}

#[derive(Default)]
struct CustomerAcc {
    total_spent: f64,
    purchase_count: usize,
    products: BTreeSet<String>,
}

pub fn customer_analysis(transactions: &[Transaction]) -> Vec<CustomerStats> {
    let mut stats: Vec<CustomerStats> = group_fold(
        transactions,
        |t| t.customer_id.as_str(),
        |acc: &mut CustomerAcc, t| {
            acc.total_spent += t.amount();
            acc.purchase_count += 1;
            acc.products.insert(t.product_name.clone());
        },
    )
    .into_iter()
    .map(|(customer_id, acc)| CustomerStats {
        customer_id: customer_id.to_owned(),
        total_spent: acc.total_spent,
        purchase_count: acc.purchase_count,
        avg_order_value: if acc.purchase_count > 0 {
            acc.total_spent / acc.purchase_count as f64
        } else {
            0.0
        },
        products_bought: acc.products.into_iter().collect(),
    })
    .collect();

    stats.sort_by(|a, b| b.total_spent.total_cmp(&a.total_spent));
    stats
}

#[derive(Default)]
struct DailyAcc {
    revenue: f64,
    transaction_count: usize,
    customers: HashSet<String>,
}

/// Per-day totals in ascending date order.
pub fn daily_sales_trend(transactions: &[Transaction]) -> Vec<DailyStats> {
    let mut trend: Vec<DailyStats> = group_fold(
        transactions,
        |t| t.date.as_str(),
        |acc: &mut DailyAcc, t| {
            acc.revenue += t.amount();
            acc.transaction_count += 1;
            acc.customers.insert(t.customer_id.clone());
        },
    )
    .into_iter()
    .map(|(date, acc)| DailyStats {
        date: date.to_owned(),
        revenue: acc.revenue,
        transaction_count: acc.transaction_count,
        unique_customers: acc.customers.len(),
    })
    .collect();

    trend.sort_by(|a, b| a.date.cmp(&b.date));
    trend
}

pub fn find_peak_sales_day(transactions: &[Transaction]) -> PeakDay {
    let mut peak = PeakDay::default();

    for day in daily_sales_trend(transactions) {
        if day.revenue > peak.revenue {
            peak = PeakDay {
                date: Some(day.date),
                revenue: day.revenue,
                transaction_count: day.transaction_count,
            };
        }
    }

    peak
}

/// Every aggregate view over one record set.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesAnalysis {
    pub total_revenue: f64,
    pub regions: Vec<RegionStats>,
    pub top_products: Vec<ProductStats>,
    pub customers: Vec<CustomerStats>,
    pub daily_trend: Vec<DailyStats>,
    pub peak_day: PeakDay,
    pub low_performers: Vec<ProductStats>,
}

impl SalesAnalysis {
    pub fn compute(transactions: &[Transaction], top_n: usize, low_threshold: i64) -> Self {
        Self {
            total_revenue: calculate_total_revenue(transactions),
            regions: region_wise_sales(transactions),
            top_products: top_selling_products(transactions, top_n),
            customers: customer_analysis(transactions),
            daily_trend: daily_sales_trend(transactions),
            peak_day: find_peak_sales_day(transactions),
            low_performers: low_performing_products(transactions, low_threshold),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::parse_transactions;

    const EPSILON: f64 = 1e-9;

    fn sample() -> Vec<Transaction> {
        parse_transactions(&[
            "T1|2024-12-02|P101|Laptop|2|45000|C001|North",
            "T2|2024-12-01|P102|Mouse|20|500|C002|South",
            "T3|2024-12-01|P103|Keyboard|5|1500|C001|North",
            "T4|2024-12-03|P102|Mouse|15|500|C003|East",
            "T5|2024-12-02|P104|Monitor|3|12000|C002|South",
            "T6|2024-12-02|P101|Laptop|1|45000|C004|West",
            "T7|2024-12-03|P105|Webcam|5|3000|C001|East",
        ])
    }

    fn names(products: &[ProductStats]) -> Vec<&str> {
        products.iter().map(|p| p.product.as_str()).collect()
    }

    #[test]
    fn empty_input_is_defined() {
        let analysis = SalesAnalysis::compute(&[], DEFAULT_TOP_N, DEFAULT_LOW_THRESHOLD);

        assert_eq!(analysis.total_revenue, 0.0);
        assert!(analysis.regions.is_empty());
        assert!(analysis.top_products.is_empty());
        assert!(analysis.customers.is_empty());
        assert!(analysis.daily_trend.is_empty());
        assert!(analysis.low_performers.is_empty());
        assert_eq!(analysis.peak_day, PeakDay::default());
        assert_eq!(analysis.peak_day.date, None);
    }

    #[test]
    fn group_fold_keeps_first_seen_order() {
        let transactions = sample();

        let groups = group_fold(&transactions, |t| t.customer_id.as_str(), |n: &mut usize, _| *n += 1);

        assert_eq!(groups, vec![("C001", 3), ("C002", 2), ("C003", 1), ("C004", 1)]);
    }

    #[test]
    fn test_total_revenue() {
        let transactions = parse_transactions(&[
            "T1|2024-01-01|P101|Widget|5|10.00|C1|North",
            "T2|2024-01-02|P999|Gadget|3|20.00|C2|South",
        ]);

        assert!((calculate_total_revenue(&transactions) - 110.0).abs() < EPSILON);
    }

    #[test]
    fn test_region_wise_sales() {
        let transactions = parse_transactions(&[
            "T1|2024-01-01|P101|Widget|5|10.00|C1|North",
            "T2|2024-01-02|P999|Gadget|3|20.00|C2|South",
        ]);

        let regions = region_wise_sales(&transactions);

        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].region, "South");
        assert_eq!(regions[0].total_sales, 60.0);
        assert_eq!(format!("{:.2}", regions[0].percentage), "54.55");
        assert_eq!(regions[1].region, "North");
        assert_eq!(regions[1].total_sales, 50.0);
        assert_eq!(format!("{:.2}", regions[1].percentage), "45.45");
    }

    #[test]
    fn region_percentages_sum_to_hundred() {
        let regions = region_wise_sales(&sample());
        let sum: f64 = regions.iter().map(|r| r.percentage).sum();

        assert!((sum - 100.0).abs() < 1e-6);
        assert!(regions.windows(2).all(|w| w[0].total_sales >= w[1].total_sales));
    }

    #[test]
    fn region_percentages_zero_without_revenue() {
        let mut transactions = sample();
        for t in &mut transactions {
            t.unit_price = 0.0;
        }

        assert!(region_wise_sales(&transactions).iter().all(|r| r.percentage == 0.0));
    }

    #[test]
    fn test_top_selling_products() {
        let top = top_selling_products(&sample(), 3);

        assert_eq!(names(&top), vec!["Mouse", "Keyboard", "Webcam"]);
        assert_eq!(top[0].total_quantity, 35);
        assert_eq!(top[0].total_revenue, 17_500.0);
    }

    #[test]
    fn top_products_ties_keep_encounter_order() {
        let top = top_selling_products(&sample(), DEFAULT_TOP_N);

        // Keyboard and Webcam both sold 5; Keyboard appears first.
        assert_eq!(names(&top), vec!["Mouse", "Keyboard", "Webcam", "Laptop", "Monitor"]);
    }

    #[test]
    fn product_quantity_saturates() {
        let transactions = parse_transactions(&[
            "T1|2024-01-01|P1|Bolt|9223372036854775807|0.000001|C1|North",
            "T2|2024-01-02|P1|Bolt|10|0.000001|C2|North",
        ]);

        let top = top_selling_products(&transactions, DEFAULT_TOP_N);

        assert_eq!(top[0].total_quantity, i64::MAX);
    }

    #[test]
    fn validated_records_sum_consistently() {
        use crate::validation::{validate_and_filter, FilterCriteria};

        let transactions = parse_transactions(&[
            "T1|2024-01-01|P101|Widget|5|10.00|C1|North",
            "T2|2024-01-02|P102|Gadget|3|NaN|C2|South",
            "T3|2024-01-02|P103|Gizmo|3|inf|C3|South",
        ]);
        let (valid, _, _) = validate_and_filter(transactions, &FilterCriteria::default());

        let analysis = SalesAnalysis::compute(&valid, DEFAULT_TOP_N, DEFAULT_LOW_THRESHOLD);
        let region_sum: f64 = analysis.regions.iter().map(|r| r.total_sales).sum();
        let pct_sum: f64 = analysis.regions.iter().map(|r| r.percentage).sum();

        assert_eq!(analysis.total_revenue, 50.0);
        assert_eq!(region_sum, analysis.total_revenue);
        assert!((pct_sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_low_performing_products() {
        let low = low_performing_products(&sample(), DEFAULT_LOW_THRESHOLD);

        assert_eq!(names(&low), vec!["Laptop", "Monitor", "Keyboard", "Webcam"]);
        assert_eq!(low[0].total_quantity, 3);
        assert_eq!(low[0].total_revenue, 135_000.0);
        assert!(low.iter().all(|p| p.total_quantity < DEFAULT_LOW_THRESHOLD));
    }

    #[test]
    fn test_customer_analysis() {
        let customers = customer_analysis(&sample());

        assert_eq!(customers[0].customer_id, "C001");
        assert_eq!(customers[0].total_spent, 90_000.0 + 7_500.0 + 15_000.0);
        assert_eq!(customers[0].purchase_count, 3);
        assert!((customers[0].avg_order_value - 112_500.0 / 3.0).abs() < EPSILON);
        assert_eq!(customers[0].products_bought, vec!["Keyboard", "Laptop", "Webcam"]);
        assert!(customers.windows(2).all(|w| w[0].total_spent >= w[1].total_spent));
    }

    #[test]
    fn test_daily_sales_trend() {
        let trend = daily_sales_trend(&sample());
        let dates: Vec<&str> = trend.iter().map(|d| d.date.as_str()).collect();

        assert_eq!(dates, vec!["2024-12-01", "2024-12-02", "2024-12-03"]);
        assert_eq!(trend[0].revenue, 17_500.0);
        assert_eq!(trend[0].transaction_count, 2);
        assert_eq!(trend[0].unique_customers, 2);
        assert_eq!(trend[1].transaction_count, 3);
        assert_eq!(trend[1].unique_customers, 3);
    }

    #[test]
    fn test_find_peak_sales_day() {
        let peak = find_peak_sales_day(&sample());

        assert_eq!(peak.date.as_deref(), Some("2024-12-02"));
        assert_eq!(peak.revenue, 90_000.0 + 36_000.0 + 45_000.0);
        assert_eq!(peak.transaction_count, 3);
    }

    #[test]
    fn peak_day_tie_keeps_earliest() {
        let transactions = parse_transactions(&[
            "T1|2024-01-02|P1|A|1|100|C1|North",
            "T2|2024-01-01|P1|A|1|100|C1|North",
        ]);

        assert_eq!(find_peak_sales_day(&transactions).date.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn aggregates_ignore_input_order() {
        let forward = sample();
        let mut reversed = sample();
        reversed.reverse();

        let a = SalesAnalysis::compute(&forward, DEFAULT_TOP_N, DEFAULT_LOW_THRESHOLD);
        let b = SalesAnalysis::compute(&reversed, DEFAULT_TOP_N, DEFAULT_LOW_THRESHOLD);

        assert!((a.total_revenue - b.total_revenue).abs() < EPSILON);
        assert_eq!(a.daily_trend, b.daily_trend);
        assert_eq!(a.peak_day, b.peak_day);

        let set = |p: &[ProductStats]| names(p).into_iter().map(str::to_owned).collect::<BTreeSet<_>>();
        assert_eq!(set(a.top_products.as_slice()), set(b.top_products.as_slice()));
        assert_eq!(set(a.low_performers.as_slice()), set(b.low_performers.as_slice()));

        let mut ra: Vec<_> = a.regions.iter().map(|r| (r.region.clone(), r.transaction_count)).collect();
        let mut rb: Vec<_> = b.regions.iter().map(|r| (r.region.clone(), r.transaction_count)).collect();
        ra.sort();
        rb.sort();
        assert_eq!(ra, rb);
    }
}
