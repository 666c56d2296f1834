use term_table::row::Row;
use term_table::table_cell::{Alignment as CellAlignment, TableCell};
use term_table::{Table, TableStyle};

use crate::context::{ContextSnapshot, Phase};
use crate::reader::Transaction;

/// `0x1234...abcd` style shortening used in lists.
pub fn shorten_address(address: &str) -> String {
    if address.len() <= 9 {
        return address.to_string();
    }
    format!("{}...{}", &address[..5], &address[address.len() - 4..])
}

fn label_row(label: &str, value: String) -> Row {
    Row::new(vec![
        TableCell::builder(label)
            .alignment(CellAlignment::Right)
            .build(),
        TableCell::builder(value)
            .alignment(CellAlignment::Left)
            .build(),
    ])
}

fn header_row(text: &str, span: usize) -> Row {
    Row::new(vec![TableCell::builder(text)
        .col_span(span)
        .alignment(CellAlignment::Center)
        .build()])
}

/// Wallet and ledger status banner.
pub fn render_status(snapshot: &ContextSnapshot) -> String {
    let mut table = Table::new();
    table.style = TableStyle::extended();

    let header = match snapshot.phase {
        Phase::Disconnected => "Wallet not connected",
        Phase::Connecting => "Connecting wallet...",
        Phase::ConnectedIdle => "Wallet connected",
        Phase::Submitting => "Submitting transaction...",
    };
    table.add_row(header_row(header, 2));

    let account = snapshot
        .account
        .map(|a| a.to_string())
        .unwrap_or_else(|| "-".to_string());
    table.add_row(label_row("Account", account));

    let count = snapshot
        .transaction_count
        .map(|c| c.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    table.add_row(label_row("Transactions", count));
    table.add_row(label_row(
        "Loading",
        if snapshot.is_loading { "yes" } else { "no" }.to_string(),
    ));

    table.render()
}

/// Latest transactions, newest first. `gifs` pairs up with `transactions` by index.
pub fn render_transactions(transactions: &[Transaction], gifs: Option<&[String]>) -> String {
    if transactions.is_empty() {
        return "No transactions yet. Connect your account to see the latest transactions."
            .to_string();
    }

    let mut table = Table::new();
    table.style = TableStyle::extended();

    let mut headers = vec!["From", "To", "Amount (ETH)", "Message", "Keyword", "Time"];
    if gifs.is_some() {
        headers.push("GIF");
    }
    table.add_row(Row::new(
        headers
            .iter()
            .map(|h| {
                TableCell::builder(*h)
                    .alignment(CellAlignment::Center)
                    .build()
            })
            .collect::<Vec<_>>(),
    ));

    for (i, tx) in transactions.iter().enumerate().rev() {
        let mut cells = vec![
            TableCell::new(shorten_address(&tx.address_from)),
            TableCell::new(shorten_address(&tx.address_to)),
            TableCell::builder(tx.amount.to_string())
                .alignment(CellAlignment::Right)
                .build(),
            TableCell::new(&tx.message),
            TableCell::new(&tx.keyword),
            TableCell::new(&tx.timestamp),
        ];
        if let Some(gifs) = gifs {
            let url = gifs.get(i).map(String::as_str).unwrap_or("-");
            cells.push(TableCell::new(url));
        }
        table.add_row(Row::new(cells));
    }

    table.render()
}
