mod account;
mod catalogue;
mod play;

pub use account::{list_payouts, show_best_score, sign_in, sign_out, whoami};
pub use catalogue::list_catalogue;
pub use play::play;

/// Group digits in threes: `1234567` becomes `"1,234,567"`.
pub fn format_number(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}
