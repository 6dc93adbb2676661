//! Field mapping between QuickBooks entities and local records.

use backoffice_domain::constants::PLACEHOLDER_DOCUMENT_PREFIX;
use backoffice_domain::quickbooks::{
    Customer, EmailAddress, Item, Line, PhysicalAddress, TelephoneNumber,
};
use backoffice_domain::{
    round_cents, BackofficeError, Cliente, ClienteInput, NewPedidoItem, ProdutoInput, Result,
};

use crate::records::ProdutoRepository;

pub(crate) fn placeholder(quickbooks_id: &str) -> String {
    format!("{PLACEHOLDER_DOCUMENT_PREFIX}{quickbooks_id}")
}

pub(crate) fn require_id(id: Option<&String>) -> Result<&str> {
    id.map(String::as_str)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| BackofficeError::Validation("QuickBooks record without Id".into()))
}

/// `documento` carries the placeholder; the repository only uses it when
/// the row is created.
pub(crate) fn cliente_from_customer(
    customer: &Customer,
    quickbooks_id: &str,
) -> Result<ClienteInput> {
    let nome = customer.name().filter(|name| !name.trim().is_empty()).ok_or_else(|| {
        BackofficeError::Validation(format!("customer {quickbooks_id} has no name"))
    })?;
    let address = customer.bill_addr.clone().unwrap_or_default();

    Ok(ClienteInput {
        nome,
        documento: placeholder(quickbooks_id),
        email: customer.email(),
        telefone: customer.phone(),
        endereco: address.street(),
        cidade: address.city,
        estado: address.country_sub_division_code,
        cep: address.postal_code,
    })
}

pub(crate) fn produto_from_item(item: &Item, quickbooks_id: &str) -> Result<ProdutoInput> {
    let nome = item
        .name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| BackofficeError::Validation(format!("item {quickbooks_id} has no name")))?;

    Ok(ProdutoInput {
        codigo: item
            .sku
            .clone()
            .filter(|sku| !sku.trim().is_empty())
            .unwrap_or_else(|| placeholder(quickbooks_id)),
        nome,
        descricao: item.description.clone(),
        preco: item.unit_price.filter(|price| price.is_finite() && *price >= 0.0).unwrap_or(0.0),
        unidade: None,
        ativo: item.active.unwrap_or(true),
    })
}

/// Customer body for a push. `Id`/`SyncToken`/`sparse` are set by the caller.
pub(crate) fn customer_from_cliente(cliente: &Cliente) -> Customer {
    let has_address = cliente.endereco.is_some()
        || cliente.cidade.is_some()
        || cliente.estado.is_some()
        || cliente.cep.is_some();

    Customer {
        display_name: Some(cliente.nome.clone()),
        primary_email_addr: cliente
            .email
            .clone()
            .map(|address| EmailAddress { address: Some(address) }),
        primary_phone: cliente
            .telefone
            .clone()
            .map(|number| TelephoneNumber { free_form_number: Some(number) }),
        bill_addr: has_address.then(|| PhysicalAddress {
            line1: cliente.endereco.clone(),
            city: cliente.cidade.clone(),
            country_sub_division_code: cliente.estado.clone(),
            postal_code: cliente.cep.clone(),
            ..PhysicalAddress::default()
        }),
        ..Customer::default()
    }
}

/// Order items from `SalesItemLineDetail` lines, in document order, paired
/// with the QuickBooks item id for product resolution. Subtotal, discount
/// and other detail types are skipped.
pub(crate) fn order_items_from_lines(lines: &[Line]) -> Vec<(Option<String>, NewPedidoItem)> {
    lines
        .iter()
        .filter_map(|line| line.as_sales_item().map(|detail| (line, detail)))
        .map(|(line, detail)| {
            let quantidade = detail.qty.filter(|qty| *qty > 0.0).unwrap_or(1.0);
            let preco_unitario = detail
                .unit_price
                .or_else(|| line.amount.map(|amount| round_cents(amount / quantidade)))
                .unwrap_or(0.0);
            let item_ref = detail.item_ref.as_ref();
            let descricao = line
                .description
                .clone()
                .filter(|text| !text.trim().is_empty())
                .or_else(|| item_ref.and_then(|r| r.name.clone()))
                .unwrap_or_else(|| format!("Item {}", item_ref.map_or("?", |r| r.value.as_str())));

            (
                item_ref.map(|r| r.value.clone()),
                NewPedidoItem { produto_id: None, descricao, quantidade, preco_unitario },
            )
        })
        .collect()
}

/// [`order_items_from_lines`] with `produto_id` resolved against locally
/// synced products. Unknown items stay unlinked.
pub(crate) async fn resolve_order_items(
    produtos: &dyn ProdutoRepository,
    lines: &[Line],
) -> Result<Vec<NewPedidoItem>> {
    let mut items = Vec::new();
    for (item_ref, mut item) in order_items_from_lines(lines) {
        if let Some(item_ref) = item_ref {
            item.produto_id = produtos.find_by_quickbooks_id(&item_ref).await?.map(|p| p.id);
        }
        items.push(item);
    }
    Ok(items)
}
