//! Reminder message templates.
//!
//! Short Polish texts for the SMS and WhatsApp channels, escalating in tone
//! with the reminder level. The e-mail channel re-sends the invoice
//! document through the SaaS and carries no custom body.

use dunner_domain::{InvoiceRecord, ReminderLevel};

/// Render the reminder text for one invoice and level.
pub fn reminder_message(invoice: &InvoiceRecord, level: ReminderLevel) -> String {
    let number = &invoice.number;
    let amount = invoice.outstanding();

    match level {
        ReminderLevel::First => format!(
            "Przypomnienie: faktura {number} na kwote {amount:.2} EUR pozostaje \
             nieoplacona. Prosimy o uregulowanie platnosci."
        ),
        ReminderLevel::Second => format!(
            "Ponowne przypomnienie: faktura {number} na kwote {amount:.2} EUR wciaz \
             nie zostala oplacona. Prosimy o pilna wplate."
        ),
        ReminderLevel::Third => format!(
            "Wezwanie do zaplaty: faktura {number} na kwote {amount:.2} EUR. Brak \
             wplaty w ciagu 7 dni spowoduje skierowanie sprawy do windykacji."
        ),
    }
}
