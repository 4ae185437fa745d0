//! The closed canonical vocabulary statements standardize onto.

use serde::{Deserialize, Serialize};

/// A standardized concept name, comparable across filers.
///
/// The vocabulary is closed: mapping rules may only target these members,
/// never invent new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum CanonicalConcept {
    // income statement
    Revenue,
    CostOfRevenue,
    GrossProfit,
    OperatingExpenses,
    SellingGeneralAndAdministrative,
    ResearchAndDevelopment,
    OperatingIncome,
    InterestExpense,
    InterestIncome,
    OtherIncomeExpense,
    IncomeBeforeTax,
    IncomeTaxExpense,
    NetIncome,
    EarningsPerShareBasic,
    EarningsPerShareDiluted,

    // balance sheet
    Assets,
    CurrentAssets,
    CashAndEquivalents,
    ShortTermInvestments,
    AccountsReceivable,
    Inventory,
    PropertyPlantEquipment,
    Goodwill,
    IntangibleAssets,
    Liabilities,
    CurrentLiabilities,
    AccountsPayable,
    ShortTermDebt,
    LongTermDebt,
    StockholdersEquity,
    RetainedEarnings,
    CommonStock,
    LiabilitiesAndEquity,

    // cash flow
    OperatingCashFlow,
    InvestingCashFlow,
    FinancingCashFlow,
    CapitalExpenditures,
    DepreciationAmortization,
    ShareBasedCompensation,
    DividendsPaid,

    // comprehensive income
    ComprehensiveIncome,
}

impl CanonicalConcept {
    /// Stable identifier, used as merge key and mapping-file key.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Revenue => "Revenue",
            Self::CostOfRevenue => "CostOfRevenue",
            Self::GrossProfit => "GrossProfit",
            Self::OperatingExpenses => "OperatingExpenses",
            Self::SellingGeneralAndAdministrative => "SellingGeneralAndAdministrative",
            Self::ResearchAndDevelopment => "ResearchAndDevelopment",
            Self::OperatingIncome => "OperatingIncome",
            Self::InterestExpense => "InterestExpense",
            Self::InterestIncome => "InterestIncome",
            Self::OtherIncomeExpense => "OtherIncomeExpense",
            Self::IncomeBeforeTax => "IncomeBeforeTax",
            Self::IncomeTaxExpense => "IncomeTaxExpense",
            Self::NetIncome => "NetIncome",
            Self::EarningsPerShareBasic => "EarningsPerShareBasic",
            Self::EarningsPerShareDiluted => "EarningsPerShareDiluted",
            Self::Assets => "Assets",
            Self::CurrentAssets => "CurrentAssets",
            Self::CashAndEquivalents => "CashAndEquivalents",
            Self::ShortTermInvestments => "ShortTermInvestments",
            Self::AccountsReceivable => "AccountsReceivable",
            Self::Inventory => "Inventory",
            Self::PropertyPlantEquipment => "PropertyPlantEquipment",
            Self::Goodwill => "Goodwill",
            Self::IntangibleAssets => "IntangibleAssets",
            Self::Liabilities => "Liabilities",
            Self::CurrentLiabilities => "CurrentLiabilities",
            Self::AccountsPayable => "AccountsPayable",
            Self::ShortTermDebt => "ShortTermDebt",
            Self::LongTermDebt => "LongTermDebt",
            Self::StockholdersEquity => "StockholdersEquity",
            Self::RetainedEarnings => "RetainedEarnings",
            Self::CommonStock => "CommonStock",
            Self::LiabilitiesAndEquity => "LiabilitiesAndEquity",
            Self::OperatingCashFlow => "OperatingCashFlow",
            Self::InvestingCashFlow => "InvestingCashFlow",
            Self::FinancingCashFlow => "FinancingCashFlow",
            Self::CapitalExpenditures => "CapitalExpenditures",
            Self::DepreciationAmortization => "DepreciationAmortization",
            Self::ShareBasedCompensation => "ShareBasedCompensation",
            Self::DividendsPaid => "DividendsPaid",
            Self::ComprehensiveIncome => "ComprehensiveIncome",
        }
    }

    /// Display label used on standardized statement lines.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Revenue => "Revenue",
            Self::CostOfRevenue => "Cost of Revenue",
            Self::GrossProfit => "Gross Profit",
            Self::OperatingExpenses => "Operating Expenses",
            Self::SellingGeneralAndAdministrative => "Selling, General and Administrative",
            Self::ResearchAndDevelopment => "Research and Development",
            Self::OperatingIncome => "Operating Income",
            Self::InterestExpense => "Interest Expense",
            Self::InterestIncome => "Interest Income",
            Self::OtherIncomeExpense => "Other Income (Expense)",
            Self::IncomeBeforeTax => "Income Before Tax",
            Self::IncomeTaxExpense => "Income Tax Expense",
            Self::NetIncome => "Net Income",
            Self::EarningsPerShareBasic => "Earnings Per Share, Basic",
            Self::EarningsPerShareDiluted => "Earnings Per Share, Diluted",
            Self::Assets => "Total Assets",
            Self::CurrentAssets => "Current Assets",
            Self::CashAndEquivalents => "Cash and Cash Equivalents",
            Self::ShortTermInvestments => "Short-Term Investments",
            Self::AccountsReceivable => "Accounts Receivable",
            Self::Inventory => "Inventory",
            Self::PropertyPlantEquipment => "Property, Plant and Equipment",
            Self::Goodwill => "Goodwill",
            Self::IntangibleAssets => "Intangible Assets",
            Self::Liabilities => "Total Liabilities",
            Self::CurrentLiabilities => "Current Liabilities",
            Self::AccountsPayable => "Accounts Payable",
            Self::ShortTermDebt => "Short-Term Debt",
            Self::LongTermDebt => "Long-Term Debt",
            Self::StockholdersEquity => "Stockholders' Equity",
            Self::RetainedEarnings => "Retained Earnings",
            Self::CommonStock => "Common Stock",
            Self::LiabilitiesAndEquity => "Total Liabilities and Equity",
            Self::OperatingCashFlow => "Cash from Operating Activities",
            Self::InvestingCashFlow => "Cash from Investing Activities",
            Self::FinancingCashFlow => "Cash from Financing Activities",
            Self::CapitalExpenditures => "Capital Expenditures",
            Self::DepreciationAmortization => "Depreciation and Amortization",
            Self::ShareBasedCompensation => "Share-Based Compensation",
            Self::DividendsPaid => "Dividends Paid",
            Self::ComprehensiveIncome => "Comprehensive Income",
        }
    }

    /// Parse a mapping-file key.
    pub fn parse(s: &str) -> Option<Self> {
        ALL.iter().find(|c| c.as_str() == s).copied()
    }
}

/// Every canonical concept, for iteration and key parsing.
const ALL: [CanonicalConcept; 41] = [
    CanonicalConcept::Revenue,
    CanonicalConcept::CostOfRevenue,
    CanonicalConcept::GrossProfit,
    CanonicalConcept::OperatingExpenses,
    CanonicalConcept::SellingGeneralAndAdministrative,
    CanonicalConcept::ResearchAndDevelopment,
    CanonicalConcept::OperatingIncome,
    CanonicalConcept::InterestExpense,
    CanonicalConcept::InterestIncome,
    CanonicalConcept::OtherIncomeExpense,
    CanonicalConcept::IncomeBeforeTax,
    CanonicalConcept::IncomeTaxExpense,
    CanonicalConcept::NetIncome,
    CanonicalConcept::EarningsPerShareBasic,
    CanonicalConcept::EarningsPerShareDiluted,
    CanonicalConcept::Assets,
    CanonicalConcept::CurrentAssets,
    CanonicalConcept::CashAndEquivalents,
    CanonicalConcept::ShortTermInvestments,
    CanonicalConcept::AccountsReceivable,
    CanonicalConcept::Inventory,
    CanonicalConcept::PropertyPlantEquipment,
    CanonicalConcept::Goodwill,
    CanonicalConcept::IntangibleAssets,
    CanonicalConcept::Liabilities,
    CanonicalConcept::CurrentLiabilities,
    CanonicalConcept::AccountsPayable,
    CanonicalConcept::ShortTermDebt,
    CanonicalConcept::LongTermDebt,
    CanonicalConcept::StockholdersEquity,
    CanonicalConcept::RetainedEarnings,
    CanonicalConcept::CommonStock,
    CanonicalConcept::LiabilitiesAndEquity,
    CanonicalConcept::OperatingCashFlow,
    CanonicalConcept::InvestingCashFlow,
    CanonicalConcept::FinancingCashFlow,
    CanonicalConcept::CapitalExpenditures,
    CanonicalConcept::DepreciationAmortization,
    CanonicalConcept::ShareBasedCompensation,
    CanonicalConcept::DividendsPaid,
    CanonicalConcept::ComprehensiveIncome,
];

impl CanonicalConcept {
    /// All members of the vocabulary.
    pub const fn all() -> &'static [Self] {
        &ALL
    }
}
